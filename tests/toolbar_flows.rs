// End-to-end flows through the library: toolbar presses, hotkeys and
// persistence working together the way the GUI drives them.

use richpad::editor::Position;
use richpad::hotkeys::{classify, HotkeyAction, Key, Keystroke};
use richpad::session::{MemoryStore, Session, SnapshotStore};
use richpad::toolbar::{activate, button_state, ToolbarItem};

fn session() -> Session<MemoryStore> {
    Session::new(MemoryStore::new(), "content")
}

fn press(session: &mut Session<MemoryStore>, stroke: Keystroke) {
    if let Some(action) = classify(stroke) {
        match action {
            HotkeyAction::ToggleMark(mark) => {
                session.apply(|e| e.toggle_mark(mark)).unwrap();
            }
            HotkeyAction::Indent => session.apply(|e| e.indent(true)).unwrap(),
            HotkeyAction::Outdent => session.apply(|e| e.indent(false)).unwrap(),
        }
    }
}

fn select_whole_first_block(session: &mut Session<MemoryStore>) {
    session.apply(|e| {
        let leaf = e.document().first_leaf().unwrap();
        let len = e.document().find(leaf).unwrap().text_len();
        e.set_selection(Position::new(leaf, 0), Position::new(leaf, len));
    });
}

#[test]
fn restore_into_fresh_store_yields_empty_paragraph() {
    let mut session = session();
    session.restore();
    insta::assert_snapshot!(session.editor().document().to_string(), @r#"
    Document (1 blocks):
      Paragraph: ""
    "#);
}

#[test]
fn format_save_edit_restore_flow() {
    let mut session = session();
    session.restore();
    session.apply(|e| e.insert_text("Groceries").unwrap());
    select_whole_first_block(&mut session);
    activate(ToolbarItem::Bold, &mut session).unwrap();
    activate(ToolbarItem::BulletedList, &mut session).unwrap();

    assert!(button_state(ToolbarItem::Save, &session).enabled);
    activate(ToolbarItem::Save, &mut session).unwrap();
    let saved = session.editor().document().clone();

    session.apply(|e| {
        let leaf = e.document().first_leaf().unwrap();
        e.set_cursor(Position::new(leaf, 0));
        e.insert_text("scratch ").unwrap();
    });
    assert!(session.is_dirty());

    activate(ToolbarItem::Restore, &mut session).unwrap();
    assert!(!session.is_dirty());
    assert_eq!(*session.editor().document(), saved);
    insta::assert_snapshot!(session.editor().document().to_string(), @r#"
    Document (2 blocks):
      BulletedList:
        ListItem: "Groceries"
      Paragraph: ""
    "#);
}

#[test]
fn tab_hotkeys_nest_lists_up_to_the_cap() {
    let mut session = session();
    session.apply(|e| e.insert_text("deep").unwrap());
    activate(ToolbarItem::BulletedList, &mut session).unwrap();

    press(&mut session, Keystroke::plain(Key::Tab));
    press(&mut session, Keystroke::plain(Key::Tab));
    insta::assert_snapshot!(session.editor().document().to_string(), @r#"
    Document (2 blocks):
      BulletedList:
        BulletedList:
          BulletedList:
            ListItem: "deep"
      Paragraph: ""
    "#);

    // A fourth level is refused
    let before = session.editor().document().clone();
    press(&mut session, Keystroke::plain(Key::Tab));
    assert_eq!(*session.editor().document(), before);

    let shift_tab = Keystroke {
        command: false,
        shift: true,
        key: Key::Tab,
    };
    press(&mut session, shift_tab);
    press(&mut session, shift_tab);
    press(&mut session, shift_tab);
    insta::assert_snapshot!(session.editor().document().to_string(), @r#"
    Document (2 blocks):
      Paragraph: "deep"
      Paragraph: ""
    "#);
}

#[test]
fn mark_hotkeys_drive_the_same_toggles_as_buttons() {
    let mut session = session();
    session.apply(|e| e.insert_text("styled").unwrap());
    select_whole_first_block(&mut session);

    press(&mut session, Keystroke::command(Key::Char('b')));
    assert!(button_state(ToolbarItem::Bold, &session).active);
    press(&mut session, Keystroke::command(Key::Char('b')));
    assert!(!button_state(ToolbarItem::Bold, &session).active);

    press(&mut session, Keystroke::command(Key::Char('`')));
    assert!(button_state(ToolbarItem::Code, &session).active);
}

#[test]
fn quote_and_image_keep_a_trailing_paragraph() {
    let mut session = session();
    session.apply(|e| e.insert_text("note").unwrap());
    activate(ToolbarItem::BlockQuote, &mut session).unwrap();
    insta::assert_snapshot!(session.editor().document().to_string(), @r#"
    Document (2 blocks):
      BlockQuote: "note"
      Paragraph: ""
    "#);

    session
        .apply(|e| e.insert_image("figs/cat.png"))
        .unwrap();
    insta::assert_snapshot!(session.editor().document().to_string(), @r#"
    Document (3 blocks):
      BlockQuote: "note"
      Image("figs/cat.png")
      Paragraph: ""
    "#);
}

#[test]
fn switching_list_kinds_touches_only_the_nearest_container() {
    let mut session = session();
    session.apply(|e| e.insert_text("item").unwrap());
    activate(ToolbarItem::BulletedList, &mut session).unwrap();
    press(&mut session, Keystroke::plain(Key::Tab));
    activate(ToolbarItem::NumberedList, &mut session).unwrap();

    insta::assert_snapshot!(session.editor().document().to_string(), @r#"
    Document (2 blocks):
      BulletedList:
        NumberedList:
          ListItem: "item"
      Paragraph: ""
    "#);
    assert!(button_state(ToolbarItem::NumberedList, &session).active);
    assert!(!button_state(ToolbarItem::BulletedList, &session).active);
}

#[test]
fn oversized_document_disables_save_until_trimmed() {
    let mut session = Session::new(MemoryStore::new(), "content").with_max_blocks(Some(3));
    session.apply(|e| {
        e.insert_text("one").unwrap();
        e.insert_newline().unwrap();
        e.insert_text("two").unwrap();
        e.insert_newline().unwrap();
        e.insert_text("three").unwrap();
        e.insert_newline().unwrap();
        e.insert_text("four").unwrap();
    });
    assert!(!button_state(ToolbarItem::Save, &session).enabled);
    assert!(activate(ToolbarItem::Save, &mut session).is_err());

    session.apply(|e| {
        let last = *e.document().leaves().last().unwrap();
        let len = e.document().find(last).unwrap().text_len();
        e.set_cursor(Position::new(last, len));
        for _ in 0.."four".len() {
            e.delete_backward().unwrap();
        }
        e.delete_backward().unwrap();
    });
    assert_eq!(session.editor().document().block_count(), 3);
    assert!(button_state(ToolbarItem::Save, &session).enabled);
    activate(ToolbarItem::Save, &mut session).unwrap();
    assert!(!session.is_dirty());
}

#[test]
fn snapshots_survive_a_real_store_round_trip() {
    let mut store = MemoryStore::new();
    let raw = {
        let mut session = Session::new(MemoryStore::new(), "content");
        session.apply(|e| e.insert_text("carry over").unwrap());
        activate(ToolbarItem::HeadingOne, &mut session).unwrap();
        activate(ToolbarItem::Save, &mut session).unwrap();
        serde_json::to_string(session.editor().document()).unwrap()
    };
    store.put("content", &raw).unwrap();

    let mut session = Session::new(store, "content");
    session.restore();
    insta::assert_snapshot!(session.editor().document().to_string(), @r#"
    Document (2 blocks):
      HeadingOne: "carry over"
      Paragraph: ""
    "#);
}
