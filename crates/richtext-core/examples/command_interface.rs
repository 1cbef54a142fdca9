//! Command interface example
//!
//! Demonstrates how to use `CommandExecutor` to drive the editor.

use richtext_core::{
    BlockCommand, Command, CommandExecutor, EditCommand, EditorConfig, SelectionCommand,
};

fn main() {
    println!("=== Command interface example ===\n");

    let mut executor = CommandExecutor::new(EditorConfig::default());
    executor.subscribe(|event| println!("  event: {event:?}"));

    // 1. Content
    println!("1. Load content:");
    executor
        .execute(Command::Edit(EditCommand::SetHtml {
            html: "<div>Hello</div><div>World</div>".to_string(),
        }))
        .unwrap();
    println!("  html: {}\n", executor.editor().html());

    // 2. Typing at the end
    println!("2. Insert text at the end:");
    executor
        .execute(Command::Selection(SelectionCommand::MoveToDocumentEnd))
        .unwrap();
    executor
        .execute(Command::Edit(EditCommand::InsertPlainText {
            text: "!\nSecond  line".to_string(),
        }))
        .unwrap();
    println!("  html: {}\n", executor.editor().html());

    // 3. Block structure
    println!("3. Quote everything:");
    executor
        .execute(Command::Selection(SelectionCommand::MoveToDocumentStart))
        .unwrap();
    executor
        .execute(Command::Selection(SelectionCommand::ExpandToBlockBoundaries))
        .unwrap();
    executor
        .execute(Command::Block(BlockCommand::IncreaseQuoteLevel))
        .unwrap();
    println!("  html: {}", executor.editor().html());
    println!("  path: {}\n", executor.editor().path());

    // 4. Undo / redo
    println!("4. Undo and redo:");
    executor.execute(Command::Edit(EditCommand::Undo)).unwrap();
    println!("  after undo: {}", executor.editor().html());
    executor.execute(Command::Edit(EditCommand::Redo)).unwrap();
    println!("  after redo: {}", executor.editor().html());
    println!("  status: {:?}", executor.undo_status());
}
