use pretty_assertions::assert_eq;
use richtext_core::{
    Command, CommandExecutor, EditCommand, EditorConfig, SelectionCommand, UndoConfig,
};

fn executor_with(config: EditorConfig, html: &str) -> CommandExecutor {
    let mut executor = CommandExecutor::new(config);
    executor
        .execute(Command::Edit(EditCommand::SetHtml {
            html: html.to_string(),
        }))
        .unwrap();
    executor
        .execute(Command::Selection(SelectionCommand::MoveToDocumentEnd))
        .unwrap();
    executor
}

fn type_text(executor: &mut CommandExecutor, text: &str) {
    executor
        .execute(Command::Edit(EditCommand::InsertPlainText {
            text: text.to_string(),
        }))
        .unwrap();
}

fn undo(executor: &mut CommandExecutor) {
    executor.execute(Command::Edit(EditCommand::Undo)).unwrap();
}

fn redo(executor: &mut CommandExecutor) {
    executor.execute(Command::Edit(EditCommand::Redo)).unwrap();
}

#[test]
fn test_undo_redo_walks_the_history() {
    let mut executor = executor_with(EditorConfig::default(), "<div>a</div>");
    type_text(&mut executor, "b");
    type_text(&mut executor, "c");
    assert_eq!(executor.editor().html(), "<div>abc</div>");

    undo(&mut executor);
    assert_eq!(executor.editor().html(), "<div>ab</div>");
    undo(&mut executor);
    assert_eq!(executor.editor().html(), "<div>a</div>");
    assert!(!executor.can_undo());

    redo(&mut executor);
    assert_eq!(executor.editor().html(), "<div>ab</div>");
    redo(&mut executor);
    assert_eq!(executor.editor().html(), "<div>abc</div>");
    assert!(!executor.can_redo());
}

#[test]
fn test_edit_after_undo_drops_redo() {
    let mut executor = executor_with(EditorConfig::default(), "<div>a</div>");
    type_text(&mut executor, "b");
    undo(&mut executor);
    assert!(executor.can_redo());

    type_text(&mut executor, "x");
    assert_eq!(executor.editor().html(), "<div>ax</div>");
    assert!(!executor.can_redo());

    redo(&mut executor);
    assert_eq!(executor.editor().html(), "<div>ax</div>");
}

#[test]
fn test_undo_at_oldest_entry_is_a_no_op() {
    let mut executor = executor_with(EditorConfig::default(), "<div>a</div>");
    undo(&mut executor);
    assert_eq!(executor.editor().html(), "<div>a</div>");
    assert!(executor.is_clean());
}

#[test]
fn test_host_changes_are_undoable() {
    let mut executor = executor_with(EditorConfig::default(), "<div>a</div>");
    executor
        .execute(Command::Edit(EditCommand::SaveUndoState))
        .unwrap();

    let root = executor.editor().root();
    let doc = executor.editor_mut().document_mut();
    let block = doc.first_child(root).unwrap();
    let text = doc.first_child(block).unwrap();
    doc.set_text(text, "typed").unwrap();
    executor.mark_changed();

    undo(&mut executor);
    assert_eq!(executor.editor().html(), "<div>a</div>");
    redo(&mut executor);
    assert_eq!(executor.editor().html(), "<div>typed</div>");
}

#[test]
fn test_large_documents_keep_a_bounded_history() {
    let config = EditorConfig {
        undo: UndoConfig {
            document_size_threshold: Some(10),
            undo_limit: Some(2),
        },
        ..EditorConfig::default()
    };
    let mut executor = executor_with(config, "<div>long enough</div>");
    for text in ["1", "2", "3", "4", "5"] {
        type_text(&mut executor, text);
    }

    let mut steps = 0;
    while executor.can_undo() {
        undo(&mut executor);
        steps += 1;
    }
    assert_eq!(steps, 2);
    assert_eq!(executor.editor().html(), "<div>long enough123</div>");
}

#[test]
fn test_zero_undo_limit_disables_history_for_large_documents() {
    let config = EditorConfig {
        undo: UndoConfig {
            document_size_threshold: Some(1),
            undo_limit: Some(0),
        },
        ..EditorConfig::default()
    };
    let mut executor = executor_with(config, "<div>a</div>");
    type_text(&mut executor, "b");
    assert!(!executor.can_undo());

    undo(&mut executor);
    assert_eq!(executor.editor().html(), "<div>ab</div>");
    assert!(!executor.can_undo());
    assert!(!executor.can_redo());
}
