use crate::core::render::{CodeBlock, CodeHighlighter};
use crate::ui::theme::Theme;
use ratatui::style::{Color as TuiColor, Style};
use ratatui::text::{Line, Span};
use std::collections::{HashMap, VecDeque};
use std::hash::{Hash, Hasher};
use std::sync::{Mutex, MutexGuard, OnceLock};
use syntect::easy::HighlightLines;
use syntect::highlighting::ThemeSet;
use syntect::parsing::SyntaxSet;
use tracing::debug;

const CACHE_CAPACITY: usize = 64;

// Simple FIFO cache (bounded) for highlighted blocks
// key = (lang_norm, hash)

fn hash_code(lang: &str, code: &str, theme_name: &str) -> u64 {
    let mut hasher = std::collections::hash_map::DefaultHasher::new();
    lang.hash(&mut hasher);
    code.hash(&mut hasher);
    theme_name.hash(&mut hasher);
    hasher.finish()
}

struct SimpleCache {
    map: HashMap<(String, u64), Vec<Line<'static>>>,
    order: VecDeque<(String, u64)>,
    cap: usize,
}

impl SimpleCache {
    fn new(cap: usize) -> Self {
        Self {
            map: HashMap::new(),
            order: VecDeque::new(),
            cap,
        }
    }
    fn get(&self, k: &(String, u64)) -> Option<Vec<Line<'static>>> {
        self.map.get(k).cloned()
    }
    fn put(&mut self, k: (String, u64), v: Vec<Line<'static>>) {
        if !self.map.contains_key(&k) {
            self.order.push_back(k.clone());
        }
        self.map.insert(k, v);
        while self.map.len() > self.cap {
            if let Some(old) = self.order.pop_front() {
                self.map.remove(&old);
            } else {
                break;
            }
        }
    }
}

static SYNTAX_CACHE: Mutex<Option<SimpleCache>> = Mutex::new(None);

fn get_cache() -> MutexGuard<'static, Option<SimpleCache>> {
    // A poisoned cache only ever holds complete entries.
    SYNTAX_CACHE
        .lock()
        .unwrap_or_else(|poisoned| poisoned.into_inner())
}

fn syntax_set() -> &'static SyntaxSet {
    static SYNTAX_SET: OnceLock<SyntaxSet> = OnceLock::new();
    SYNTAX_SET.get_or_init(SyntaxSet::load_defaults_newlines)
}

fn theme_set() -> &'static ThemeSet {
    static THEME_SET: OnceLock<ThemeSet> = OnceLock::new();
    THEME_SET.get_or_init(ThemeSet::load_defaults)
}

fn normalize_lang_hint(s: &str) -> String {
    let t = s.trim().to_ascii_lowercase();
    match t.as_str() {
        "py" | "python" => "python".into(),
        "bash" | "sh" | "zsh" | "shell" => "bash".into(),
        "js" | "javascript" | "jsx" => "javascript".into(),
        "ts" | "tsx" | "typescript" => "typescript".into(),
        "json" => "json".into(),
        "toml" => "toml".into(),
        "yaml" | "yml" => "yaml".into(),
        "rust" | "rs" => "rust".into(),
        "go" => "go".into(),
        "c" | "h" => "c".into(),
        "cpp" | "cc" | "cxx" | "hpp" | "hxx" => "cpp".into(),
        "java" => "java".into(),
        "html" => "html".into(),
        "css" => "css".into(),
        "sql" => "sql".into(),
        other => other.into(),
    }
}

fn parse_tui_color_from_syntect(c: syntect::highlighting::Color) -> TuiColor {
    TuiColor::Rgb(c.r, c.g, c.b)
}

/// Highlights fenced code with syntect, caching results across re-renders.
#[derive(Debug, Clone)]
pub struct SyntectHighlighter {
    theme_name: &'static str,
}

impl SyntectHighlighter {
    pub fn for_theme(theme: &Theme) -> Self {
        Self {
            theme_name: theme.syntax_theme,
        }
    }

    pub fn highlight_source(&self, lang_hint: &str, code: &str) -> Option<Vec<Line<'static>>> {
        let lang_norm = normalize_lang_hint(lang_hint);
        let key = (
            lang_norm.clone(),
            hash_code(&lang_norm, code, self.theme_name),
        );
        if let Some(lines) = get_cache().as_ref().and_then(|c| c.get(&key)) {
            return Some(lines);
        }

        let ps = syntax_set();
        let ts = theme_set();
        let syn_theme = ts
            .themes
            .get(self.theme_name)
            .or_else(|| ts.themes.get("base16-ocean.dark"))?;
        let syntax = ps
            .find_syntax_by_token(&lang_norm)
            .unwrap_or_else(|| ps.find_syntax_plain_text());

        let mut h = HighlightLines::new(syntax, syn_theme);
        let mut out: Vec<Line<'static>> = Vec::new();
        for line in syntect::util::LinesWithEndings::from(code) {
            let ranges = h.highlight_line(line, ps).ok()?;
            let spans: Vec<Span<'static>> = ranges
                .into_iter()
                .map(|(style, text)| {
                    let frag = text.strip_suffix('\n').unwrap_or(text);
                    Span::styled(
                        frag.to_string(),
                        Style::default().fg(parse_tui_color_from_syntect(style.foreground)),
                    )
                })
                .filter(|span| !span.content.is_empty())
                .collect();
            out.push(Line::from(spans));
        }

        get_cache()
            .get_or_insert_with(|| SimpleCache::new(CACHE_CAPACITY))
            .put(key, out.clone());
        Some(out)
    }
}

impl CodeHighlighter for SyntectHighlighter {
    fn highlight(&self, block: &mut CodeBlock) {
        let lang = block.language.as_deref().unwrap_or("");
        match self.highlight_source(lang, &block.source) {
            Some(lines) if !lines.is_empty() => block.mark_highlighted(lines),
            _ => {
                debug!(lang, "highlighting failed; keeping plain code lines");
                let plain = std::mem::take(&mut block.lines);
                block.mark_highlighted(plain);
            }
        }
    }
}
