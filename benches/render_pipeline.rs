use criterion::{criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use parley::core::app::build_pipeline;
use parley::core::frame::FrameDecoder;
use parley::core::render::IncrementalRenderer;
use parley::ui::theme::Theme;
use parley::utils::wrap::wrap_lines;

const PARAGRAPH: &str = "lorem ipsum dolor sit amet consectetur adipiscing elit sed do eiusmod tempor incididunt ut labore et dolore magna aliqua ";
const CODE: &str = "```rust\nfn main() {\n    println!(\"hello\");\n}\n```\n";

/// A reply split into the small deltas a streaming endpoint sends.
fn make_deltas(paragraphs: usize) -> Vec<String> {
    let mut reply = String::new();
    for i in 0..paragraphs {
        reply.push_str(PARAGRAPH);
        reply.push_str("\n\n");
        if i % 4 == 3 {
            reply.push_str(CODE);
        }
    }
    reply
        .split_inclusive(' ')
        .map(str::to_string)
        .collect()
}

fn make_body(deltas: &[String]) -> Vec<u8> {
    let mut body = String::new();
    for delta in deltas {
        let payload = serde_json::json!({ "text": delta });
        body.push_str(&format!("data: {payload}\n\n"));
    }
    body.push_str("data: [DONE]\n\n");
    body.into_bytes()
}

fn bench_render_pipeline(c: &mut Criterion) {
    let theme = Theme::dark_default();
    let width = 80u16;

    for &paragraphs in &[4usize, 16usize] {
        let deltas = make_deltas(paragraphs);
        let mut group = c.benchmark_group(format!("render_pipeline_paragraphs{}", paragraphs));
        group.throughput(Throughput::Elements(deltas.len() as u64));

        for syntax in [false, true] {
            let pipeline = build_pipeline(&theme, syntax);
            group.bench_function(BenchmarkId::new("stream_render", syntax), |b| {
                b.iter(|| {
                    let mut renderer = IncrementalRenderer::new();
                    renderer.begin();
                    for delta in &deltas {
                        renderer.push_delta(delta, &pipeline);
                        let _ = wrap_lines(
                            &renderer.view_lines(theme.streaming_indicator_style),
                            width,
                        );
                    }
                    renderer.finish(&pipeline);
                })
            });
        }

        let body = make_body(&deltas);
        group.bench_function(BenchmarkId::new("decode_frames", body.len()), |b| {
            b.iter(|| {
                let mut decoder = FrameDecoder::new();
                let mut frames = 0usize;
                for chunk in body.chunks(64) {
                    frames += decoder.push(chunk).count();
                }
                frames
            })
        });

        group.finish();
    }
}

criterion_group!(benches, bench_render_pipeline);
criterion_main!(benches);
