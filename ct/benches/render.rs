use chattemplate::{ChatMessage, ContentPart, build_conversation};
use criterion::{Criterion, criterion_group, criterion_main};
use std::hint::black_box;

fn multi_turn_messages(turns: usize) -> Vec<ChatMessage> {
    let mut messages = vec![ChatMessage::user(vec![
        ContentPart::text("describe this image"),
        ContentPart::image_url("https://example.com/cat.png"),
    ])];
    for i in 1..turns {
        if i % 2 == 1 {
            messages.push(ChatMessage::assistant(format!("answer number {} with some detail", i)));
        } else {
            messages.push(ChatMessage::user(format!("follow-up question {}", i)));
        }
    }
    messages
}

fn bench_render(c: &mut Criterion) {
    let short = multi_turn_messages(1);
    let long = multi_turn_messages(64);

    c.bench_function("build_and_render_single_turn", |b| {
        b.iter(|| {
            let conv = build_conversation("qwen2-vl", None, black_box(short.as_slice()), false).unwrap();
            black_box(conv.render().unwrap())
        })
    });

    let conv = build_conversation("qwen2-vl", None, &long, false).unwrap();
    c.bench_function("render_64_turns", |b| b.iter(|| black_box(conv.render().unwrap())));
}

criterion_group!(benches, bench_render);
criterion_main!(benches);
