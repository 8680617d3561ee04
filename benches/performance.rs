use criterion::{BenchmarkId, Criterion, black_box, criterion_group, criterion_main};
use groq_engineer::{
    Message, Transcript, estimate_tokens, is_approaching_limit, parse_instructions,
    truncate_messages,
};

// Alternating user/assistant messages of a fixed size
fn create_messages(count: usize, text_size: usize) -> Vec<Message> {
    let text = "a".repeat(text_size);
    (0..count)
        .map(|i| {
            if i % 2 == 0 {
                Message::user(&text)
            } else {
                Message::assistant(&text)
            }
        })
        .collect()
}

fn create_transcript(count: usize, text_size: usize) -> Transcript {
    let mut transcript = Transcript::new();
    for message in create_messages(count, text_size) {
        transcript.append(message);
    }
    transcript
}

// Reply with `tags` instructions separated by prose
fn create_reply(tags: usize) -> String {
    let mut reply = String::new();
    for i in 0..tags {
        reply.push_str("Here is the next step of the plan, explained at some length.\n");
        match i % 4 {
            0 => reply.push_str(&format!(
                "<create_file path=\"src/module_{}.py\">\ndef f():\n    return {}\n</create_file>\n",
                i, i
            )),
            1 => reply.push_str(&format!("<read_file path=\"src/module_{}.py\"/>\n", i - 1)),
            2 => reply.push_str("<list_files dir=\"src\"/>\n"),
            _ => reply.push_str("<run_code language=\"python\">\nprint(1 + 1)\n</run_code>\n"),
        }
    }
    reply
}

// Benchmark: instruction parsing by number of tags
fn bench_parse_instructions(c: &mut Criterion) {
    let mut group = c.benchmark_group("parse_instructions");

    for tags in [0, 1, 4, 16, 64].iter() {
        let reply = create_reply(*tags);
        group.bench_with_input(BenchmarkId::from_parameter(tags), &reply, |b, r| {
            b.iter(|| parse_instructions(black_box(r)));
        });
    }

    group.finish();
}

// Benchmark: long prose reply with no instructions
fn bench_parse_plain_reply(c: &mut Criterion) {
    let reply = "Rust ownership means each value has a single owner. ".repeat(200);
    c.bench_function("parse_plain_reply", |b| {
        b.iter(|| parse_instructions(black_box(&reply)));
    });
}

// Benchmark: Markdown export by transcript length
fn bench_export(c: &mut Criterion) {
    let mut group = c.benchmark_group("transcript_export");

    for count in [10, 100, 500].iter() {
        let transcript = create_transcript(*count, 400);
        group.bench_with_input(BenchmarkId::from_parameter(count), &transcript, |b, t| {
            b.iter(|| black_box(t).export());
        });
    }

    group.finish();
}

// Benchmark: bounded context views
fn bench_to_context(c: &mut Criterion) {
    let mut group = c.benchmark_group("transcript_to_context");
    let transcript = create_transcript(200, 200);

    for limit in [None, Some(10), Some(50)].iter() {
        let label = limit.map_or("all".to_string(), |l| l.to_string());
        group.bench_with_input(BenchmarkId::from_parameter(label), limit, |b, l| {
            b.iter(|| transcript.to_context(black_box(*l)).len());
        });
    }

    group.finish();
}

// Benchmark: estimate_tokens with varying message counts
fn bench_estimate_tokens_by_count(c: &mut Criterion) {
    let mut group = c.benchmark_group("estimate_tokens_by_count");

    for count in [0, 1, 10, 50, 100].iter() {
        let messages = create_messages(*count, 100);
        group.bench_with_input(BenchmarkId::from_parameter(count), &messages, |b, msgs| {
            b.iter(|| estimate_tokens(black_box(msgs)));
        });
    }

    group.finish();
}

// Benchmark: check and truncate before a request
fn bench_realistic_workflow(c: &mut Criterion) {
    let mut group = c.benchmark_group("realistic_workflow");

    let messages = create_messages(50, 200);

    group.bench_function("check_and_truncate", |b| {
        b.iter(|| {
            let msgs = black_box(&messages);
            if is_approaching_limit(msgs, black_box(8192), black_box(0.9)) {
                truncate_messages(msgs, black_box(10))
            } else {
                msgs.to_vec()
            }
        });
    });

    group.finish();
}

criterion_group!(
    benches,
    bench_parse_instructions,
    bench_parse_plain_reply,
    bench_export,
    bench_to_context,
    bench_estimate_tokens_by_count,
    bench_realistic_workflow,
);
criterion_main!(benches);
