//! Replay a scripted annotation session headlessly and print the resulting
//! interchange JSON. Handy for eyeballing gesture semantics without a
//! browser: `RUST_LOG=trace cargo run --example replay_gestures`.

use rp_core::codec::annotations_to_json;
use rp_core::id::DocumentId;
use rp_core::store::{AnnotationStore, Tool};
use rp_editor::{CommandStack, DEFAULT_HISTORY_DEPTH, InputEvent, Modifiers, PageSurface};
use rp_render::HeuristicMetrics;

fn main() {
    env_logger::init();

    let doc = DocumentId::intern("replay-doc");
    let mut store = AnnotationStore::new();
    let mut history = CommandStack::new(DEFAULT_HISTORY_DEPTH);
    let mut surface = PageSurface::new(doc, 1, 1.0);
    store.set_author("replay@example.com");

    let script: Vec<(Tool, Vec<InputEvent>)> = vec![
        (
            Tool::Rectangle,
            vec![
                InputEvent::pointer_down(20.0, 20.0, Modifiers::NONE, 0),
                InputEvent::pointer_move(160.0, 90.0, Modifiers::NONE, 16),
                InputEvent::pointer_up(160.0, 90.0, Modifiers::NONE, 32),
            ],
        ),
        (
            Tool::Freehand,
            vec![
                InputEvent::pointer_down(40.0, 120.0, Modifiers::NONE, 100),
                InputEvent::pointer_move(60.0, 140.0, Modifiers::NONE, 116),
                InputEvent::pointer_move(90.0, 125.0, Modifiers::NONE, 132),
                InputEvent::pointer_up(110.0, 150.0, Modifiers::NONE, 148),
            ],
        ),
        (
            Tool::StampApproved,
            vec![
                InputEvent::pointer_down(300.0, 40.0, Modifiers::NONE, 200),
                InputEvent::pointer_up(300.0, 40.0, Modifiers::NONE, 216),
            ],
        ),
    ];

    for (tool, events) in script {
        store.set_tool(doc, tool);
        surface.tool_changed();
        for event in &events {
            surface.handle_event(event, &mut store, &mut history, &HeuristicMetrics);
        }
    }

    match annotations_to_json(store.annotations(doc)) {
        Ok(json) => println!("{json}"),
        Err(reason) => eprintln!("export failed: {reason}"),
    }
}
