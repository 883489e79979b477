#![allow(dead_code)]

use modmenu_core::{HostRoutine, Instruction, MenuUi, MethodRef, ModMenu, OpCode, UiError};
use std::collections::HashSet;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

/// UI double that records every primitive call.
#[derive(Default)]
pub struct RecordingUi {
    pub events: Vec<String>,
    pub failing_menus: HashSet<String>,
    pub collapsed_menus: HashSet<String>,
    pub panicking_menus: HashSet<String>,
    pub close_window: bool,
    pub panicking_window: bool,
}

impl RecordingUi {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn opened_menus(&self) -> Vec<String> {
        self.events
            .iter()
            .filter_map(|event| event.strip_prefix("begin_menu:"))
            .map(str::to_string)
            .collect()
    }

    pub fn count(&self, event: &str) -> usize {
        self.events.iter().filter(|value| *value == event).count()
    }
}

impl MenuUi for RecordingUi {
    fn begin_menu(&mut self, label: &str, _enabled: bool) -> Result<bool, UiError> {
        if self.panicking_menus.contains(label) {
            panic!("ui backend crashed on {label}");
        }
        if self.failing_menus.contains(label) {
            self.events.push(format!("begin_menu_failed:{label}"));
            return Err(UiError::new("begin_menu", format!("cannot open {label}")));
        }
        if self.collapsed_menus.contains(label) {
            self.events.push(format!("begin_menu_collapsed:{label}"));
            return Ok(false);
        }
        self.events.push(format!("begin_menu:{label}"));
        Ok(true)
    }

    fn end_menu(&mut self) -> Result<(), UiError> {
        self.events.push("end_menu".to_string());
        Ok(())
    }

    fn begin_window(&mut self, title: &str, open: &mut bool) -> Result<bool, UiError> {
        if self.panicking_window {
            panic!("ui backend crashed on window {title}");
        }
        self.events.push(format!("begin_window:{title}"));
        if self.close_window {
            *open = false;
        }
        Ok(true)
    }

    fn end_window(&mut self) -> Result<(), UiError> {
        self.events.push("end_window".to_string());
        Ok(())
    }
}

/// Render callback that counts its invocations.
pub fn counter() -> (Arc<AtomicUsize>, impl Fn() + Send + Sync + 'static) {
    let calls = Arc::new(AtomicUsize::new(0));
    let handle = Arc::clone(&calls);
    (calls, move || {
        handle.fetch_add(1, Ordering::SeqCst);
    })
}

pub fn calls(counter: &AtomicUsize) -> usize {
    counter.load(Ordering::SeqCst)
}

pub fn imgui(name: &str) -> MethodRef {
    MethodRef::new("ImGui", name)
}

/// Builds a menu-bar routine with one block per top-level menu.
///
/// Each block ends with `EndMenu` followed by three filler slots, so the
/// slot four past the last `EndMenu` is the `EndMainMenuBar` call.
pub fn menu_bar_routine(menus: &[&str]) -> HostRoutine {
    let mut instructions = vec![Instruction::call(imgui("BeginMainMenuBar"))];
    for menu in menus {
        instructions.extend([
            Instruction::load_string(*menu),
            Instruction::op(OpCode::LoadConst),
            Instruction::call(imgui("BeginMenu")),
            Instruction::op(OpCode::BranchIfFalse),
            Instruction::call(imgui("MenuItem")),
            Instruction::op(OpCode::Pop),
            Instruction::call(imgui("EndMenu")),
            Instruction::op(OpCode::Nop),
            Instruction::op(OpCode::Nop),
            Instruction::op(OpCode::Nop),
        ]);
    }
    instructions.push(Instruction::call(imgui("EndMainMenuBar")));
    instructions.push(Instruction::op(OpCode::Return));
    HostRoutine::new("DrawMenuBar", instructions)
}

/// Executes one host frame: walks the routine and honors the spliced
/// dispatch call. Returns how many times the dispatch call ran.
pub fn run_host_frame(routine: &HostRoutine, menu: &ModMenu, ui: &mut RecordingUi) -> usize {
    let dispatch = menu.config().dispatch_call.clone();
    let mut dispatched = 0;
    routine.for_each_call(|method| {
        if *method == dispatch {
            menu.render_menu(&mut *ui);
            dispatched += 1;
        }
    });
    menu.on_after_gui(ui);
    dispatched
}
