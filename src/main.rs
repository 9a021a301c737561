use clap::Parser;
use fltk::{prelude::*, *};
use std::cell::RefCell;
use std::path::PathBuf;
use std::rc::Rc;

use richpad::editor::Position;
use richpad::hotkeys::{self, HotkeyAction, Keystroke};
use richpad::render::{self, RenderedDocument};
use richpad::app_state::{self, AppState as PersistedAppState, WindowGeometry};
use richpad::session::{FileStore, Session};
use richpad::toolbar::{self, ItemAction, ToolbarItem, TOOLBAR_ORDER};

#[derive(Parser, Debug)]
#[command(name = "richpad")]
#[command(about = "A rich-text editor with a formatting toolbar", long_about = None)]
struct Args {
    /// Directory for stored documents (default: the user data dir)
    #[arg(short, long, value_name = "DIR")]
    dir: Option<PathBuf>,

    /// Storage key of the document to edit (default: the last open key)
    #[arg(short, long)]
    key: Option<String>,

    /// Refuse to save documents with more top-level blocks than this
    #[arg(long, value_name = "N")]
    max_blocks: Option<usize>,
}

const TOOLBAR_HEIGHT: i32 = 32;
const STATUS_HEIGHT: i32 = 24;

struct AppState {
    session: Session<FileStore>,
    rendered: RenderedDocument,
}

type SharedState = Rc<RefCell<AppState>>;
type SharedButtons = Rc<RefCell<Vec<(ToolbarItem, button::Button)>>>;

fn refresh(
    state: &SharedState,
    buffer: &mut text::TextBuffer,
    style_buffer: &mut text::TextBuffer,
    display: &mut text::TextDisplay,
    buttons: &SharedButtons,
    status: &Rc<RefCell<frame::Frame>>,
) {
    let mut state = state.borrow_mut();
    state.rendered = render::render(state.session.editor().document());
    buffer.set_text(&state.rendered.text);
    style_buffer.set_text(&state.rendered.style);
    if let Some(byte) = state.rendered.byte_for(state.session.editor().cursor()) {
        display.set_insert_position(byte as i32);
    }

    for (item, btn) in buttons.borrow_mut().iter_mut() {
        let bs = toolbar::button_state(*item, &state.session);
        btn.set_label_color(if bs.active {
            enums::Color::Blue
        } else {
            enums::Color::Black
        });
        if bs.enabled {
            btn.activate();
        } else {
            btn.deactivate();
        }
        btn.redraw();
    }

    status.borrow_mut().set_label(&state.session.status_text());
    app::redraw();
}

/// Open a native chooser for an image file; cancelling returns None. A
/// fresh chooser every time, so picking the same file twice works.
fn pick_image() -> Option<String> {
    let mut chooser = dialog::NativeFileChooser::new(dialog::NativeFileChooserType::BrowseFile);
    chooser.set_title("Insert image");
    chooser.set_filter("Images\t*.{png,jpg,jpeg,gif,bmp}");
    chooser.show();
    let path = chooser.filename();
    if path.as_os_str().is_empty() {
        None
    } else {
        Some(path.to_string_lossy().to_string())
    }
}

fn keystroke_from_event() -> Option<Keystroke> {
    let event_state = app::event_state();
    let command = event_state.contains(enums::EventState::Ctrl)
        || event_state.contains(enums::EventState::Meta);
    let shift = event_state.contains(enums::EventState::Shift);
    let key = app::event_key();
    if key == enums::Key::Tab {
        return Some(Keystroke {
            command,
            shift,
            key: hotkeys::Key::Tab,
        });
    }
    let bits = key.bits();
    if (32..127).contains(&bits) {
        return Some(Keystroke {
            command,
            shift,
            key: hotkeys::Key::Char((bits as u8 as char).to_ascii_lowercase()),
        });
    }
    None
}

fn apply_hotkey(action: HotkeyAction, state: &SharedState) {
    let mut state = state.borrow_mut();
    let result = match action {
        HotkeyAction::ToggleMark(mark) => state.session.apply(|e| e.toggle_mark(mark)),
        HotkeyAction::Indent => state.session.apply(|e| e.indent(true)),
        HotkeyAction::Outdent => state.session.apply(|e| e.indent(false)),
    };
    if let Err(err) = result {
        eprintln!("Edit failed: {err}");
    }
}

fn main() {
    let args = Args::parse();
    let saved_state = PersistedAppState::load();

    let storage_dir = args
        .dir
        .or_else(app_state::default_storage_dir)
        .unwrap_or_else(|| PathBuf::from("."));
    let key = args
        .key
        .or_else(|| saved_state.last_key.clone())
        .unwrap_or_else(|| "content".to_string());
    let store = FileStore::new(storage_dir);
    let mut session = Session::new(store, key.clone()).with_max_blocks(args.max_blocks);
    session.restore();

    let app = app::App::default();
    let geometry = if saved_state.window.is_usable() {
        saved_state.window
    } else {
        WindowGeometry::default()
    };
    let mut wind = window::Window::new(
        geometry.x,
        geometry.y,
        geometry.width,
        geometry.height,
        "richpad",
    );
    wind.begin();

    let win_w = geometry.width;
    let win_h = geometry.height;

    let state: SharedState = Rc::new(RefCell::new(AppState {
        session,
        rendered: RenderedDocument::default(),
    }));
    let buttons: SharedButtons = Rc::new(RefCell::new(Vec::new()));

    let mut buffer = text::TextBuffer::default();
    let mut style_buffer = text::TextBuffer::default();
    let mut display = text::TextDisplay::new(
        0,
        TOOLBAR_HEIGHT,
        win_w,
        win_h - TOOLBAR_HEIGHT - STATUS_HEIGHT,
        None,
    );
    display.set_buffer(buffer.clone());
    display.set_frame(enums::FrameType::FlatBox);
    display.set_color(enums::Color::from_rgb(255, 255, 250));
    display.set_highlight_data(style_buffer.clone(), render::style_table());
    display.wrap_mode(text::WrapMode::AtBounds, 0);
    display.show_cursor(true);

    let status = Rc::new(RefCell::new({
        let mut f = frame::Frame::new(0, win_h - STATUS_HEIGHT, win_w, STATUS_HEIGHT, None);
        f.set_frame(enums::FrameType::FlatBox);
        f.set_color(enums::Color::Black);
        f.set_label_color(enums::Color::White);
        f.set_align(enums::Align::Left | enums::Align::Inside);
        f
    }));

    // Toolbar row
    {
        let mut x = 4;
        for item in TOOLBAR_ORDER {
            let width = match item {
                ToolbarItem::Restore | ToolbarItem::Save => 64,
                _ => 36,
            };
            let mut btn = button::Button::new(x, 2, width, TOOLBAR_HEIGHT - 4, None);
            btn.set_label(item.label());
            btn.set_tooltip(item.tooltip());
            x += width + 2;

            let state = state.clone();
            let buttons_cb = buttons.clone();
            let status = status.clone();
            let mut buffer = buffer.clone();
            let mut style_buffer = style_buffer.clone();
            let mut display = display.clone();
            btn.set_callback(move |_| {
                let result = match item.action() {
                    ItemAction::InsertImage => match pick_image() {
                        Some(src) => state
                            .borrow_mut()
                            .session
                            .apply(|e| e.insert_image(&src))
                            .map_err(|err| err.to_string()),
                        None => Ok(()),
                    },
                    _ => toolbar::activate(item, &mut state.borrow_mut().session),
                };
                if let Err(err) = result {
                    status.borrow_mut().set_label(&format!("Error: {err}"));
                    app::redraw();
                    return;
                }
                refresh(&state, &mut buffer, &mut style_buffer, &mut display, &buttons_cb, &status);
            });
            buttons.borrow_mut().push((item, btn));
        }
    }

    wind.end();
    wind.resizable(&display);
    wind.show();

    // Keyboard and mouse handling over the display
    {
        let state = state.clone();
        let buttons = buttons.clone();
        let status = status.clone();
        let mut buffer = buffer.clone();
        let mut style_buffer = style_buffer.clone();
        let drag_anchor: Rc<RefCell<Option<Position>>> = Rc::new(RefCell::new(None));

        display.handle(move |widget, evt| match evt {
            enums::Event::Push => {
                let byte = widget.xy_to_position(
                    app::event_x(),
                    app::event_y(),
                    text::PositionType::Cursor,
                ) as usize;
                let pos = state.borrow().rendered.position_for(byte);
                if let Some(pos) = pos {
                    state
                        .borrow_mut()
                        .session
                        .apply(|e| e.set_cursor(pos));
                    *drag_anchor.borrow_mut() = Some(pos);
                    refresh(&state, &mut buffer, &mut style_buffer, widget, &buttons, &status);
                }
                true
            }
            enums::Event::Drag => {
                let byte = widget.xy_to_position(
                    app::event_x(),
                    app::event_y(),
                    text::PositionType::Cursor,
                ) as usize;
                let anchor = *drag_anchor.borrow();
                let pos = state.borrow().rendered.position_for(byte);
                if let (Some(anchor), Some(focus)) = (anchor, pos) {
                    state
                        .borrow_mut()
                        .session
                        .apply(|e| e.set_selection(anchor, focus));
                    refresh(&state, &mut buffer, &mut style_buffer, widget, &buttons, &status);
                }
                true
            }
            enums::Event::KeyDown => {
                if let Some(action) = keystroke_from_event().and_then(hotkeys::classify) {
                    apply_hotkey(action, &state);
                    refresh(&state, &mut buffer, &mut style_buffer, widget, &buttons, &status);
                    return true;
                }

                let key = app::event_key();
                let event_state = app::event_state();
                let command = event_state.contains(enums::EventState::Ctrl)
                    || event_state.contains(enums::EventState::Meta);
                let handled = {
                    let mut st = state.borrow_mut();
                    match key {
                        enums::Key::BackSpace => {
                            if let Err(err) = st.session.apply(|e| e.delete_backward()) {
                                eprintln!("Edit failed: {err}");
                            }
                            true
                        }
                        enums::Key::Enter | enums::Key::KPEnter => {
                            if let Err(err) = st.session.apply(|e| e.insert_newline()) {
                                eprintln!("Edit failed: {err}");
                            }
                            true
                        }
                        enums::Key::Left => {
                            st.session.apply(|e| e.move_left());
                            true
                        }
                        enums::Key::Right => {
                            st.session.apply(|e| e.move_right());
                            true
                        }
                        enums::Key::Up => {
                            st.session.apply(|e| e.move_up());
                            true
                        }
                        enums::Key::Down => {
                            st.session.apply(|e| e.move_down());
                            true
                        }
                        enums::Key::Home => {
                            st.session.apply(|e| e.move_line_start());
                            true
                        }
                        enums::Key::End => {
                            st.session.apply(|e| e.move_line_end());
                            true
                        }
                        _ => {
                            let txt = app::event_text();
                            if !command && !txt.is_empty() && !txt.chars().any(char::is_control) {
                                if let Err(err) = st.session.apply(|e| e.insert_text(&txt)) {
                                    eprintln!("Edit failed: {err}");
                                }
                                true
                            } else {
                                false
                            }
                        }
                    }
                };
                if handled {
                    refresh(&state, &mut buffer, &mut style_buffer, widget, &buttons, &status);
                }
                handled
            }
            _ => false,
        });
    }

    wind.set_callback(move |w| {
        let state = PersistedAppState {
            window: WindowGeometry {
                x: w.x(),
                y: w.y(),
                width: w.w(),
                height: w.h(),
            },
            last_key: Some(key.clone()),
        };
        if let Err(err) = state.save() {
            eprintln!("Failed to save application state: {err}");
        }
        app::quit();
    });

    refresh(&state, &mut buffer, &mut style_buffer, &mut display, &buttons, &status);

    app.run().unwrap();
}
