use criterion::{BatchSize, Criterion, black_box, criterion_group, criterion_main};
use richtext_core::{
    BlockCommand, Command, CommandExecutor, EditCommand, EditorConfig, EditorCore,
    SelectionCommand,
};

fn large_html(block_count: usize) -> String {
    let mut out = String::with_capacity(block_count * 96);
    for i in 0..block_count {
        out.push_str(&format!(
            "<div>{i:06} the quick <b>brown</b> fox jumps over the <i>lazy</i> dog</div>"
        ));
    }
    out
}

fn loaded_executor(html: &str) -> CommandExecutor {
    let mut executor = CommandExecutor::new(EditorConfig::default());
    executor
        .execute(Command::Edit(EditCommand::SetHtml {
            html: html.to_string(),
        }))
        .unwrap();
    executor
}

fn bench_set_html(c: &mut Criterion) {
    let html = large_html(5_000);
    c.bench_function("set_html/5k_blocks", |b| {
        b.iter(|| {
            let mut editor = EditorCore::new(EditorConfig::default());
            editor.set_html(black_box(&html)).unwrap();
            black_box(editor.document().node_count());
        })
    });
}

fn bench_snapshot(c: &mut Criterion) {
    let html = large_html(5_000);
    let mut executor = loaded_executor(&html);
    c.bench_function("snapshot/5k_blocks", |b| {
        b.iter(|| {
            let snapshot = executor.editor_mut().snapshot().unwrap();
            black_box(snapshot.len());
        })
    });
}

fn bench_typing_with_undo(c: &mut Criterion) {
    let html = large_html(500);
    c.bench_function("typing_end/50_inserts", |b| {
        b.iter_batched(
            || {
                let mut executor = loaded_executor(&html);
                executor
                    .execute(Command::Selection(SelectionCommand::MoveToDocumentEnd))
                    .unwrap();
                executor
            },
            |mut executor| {
                for _ in 0..50 {
                    executor
                        .execute(Command::Edit(EditCommand::InsertPlainText {
                            text: "x".to_string(),
                        }))
                        .unwrap();
                }
                black_box(executor.can_undo());
            },
            BatchSize::LargeInput,
        )
    });
}

fn bench_quote_round_trip(c: &mut Criterion) {
    let html = large_html(2_000);
    c.bench_function("quote_round_trip/2k_blocks", |b| {
        b.iter_batched(
            || {
                let mut executor = loaded_executor(&html);
                executor
                    .execute(Command::Selection(SelectionCommand::ExpandToBlockBoundaries))
                    .unwrap();
                executor
            },
            |mut executor| {
                executor
                    .execute(Command::Block(BlockCommand::IncreaseQuoteLevel))
                    .unwrap();
                executor
                    .execute(Command::Block(BlockCommand::DecreaseQuoteLevel))
                    .unwrap();
                black_box(executor.editor().html().len());
            },
            BatchSize::LargeInput,
        )
    });
}

criterion_group!(
    benches,
    bench_set_html,
    bench_snapshot,
    bench_typing_with_undo,
    bench_quote_round_trip
);
criterion_main!(benches);
