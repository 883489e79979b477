//! CLI smoke host for `modmenu_core`.
//!
//! # Responsibility
//! - Drive one simulated host through load, two frames and unload.
//! - Print the drawn menu tree so splice and fallback paths can be eyeballed.

use clap::Parser;
use modmenu_core::inventory;
use modmenu_core::{
    default_log_level, init_logging, HostRoutine, Instruction, Marker, MenuUi, MethodInfo,
    MethodRef, ModMenu, ModMenuConfig, ModuleDescriptor, OpCode, TypeInfo, UiError, Visibility,
};
use std::path::PathBuf;
use std::process::ExitCode;

/// Simulated host for the shared mod menu.
#[derive(Parser)]
#[command(name = "modmenu_cli")]
#[command(version, about, long_about = None)]
struct Args {
    /// Build a menu bar without `EndMenu` calls to exercise the backup window.
    #[arg(long)]
    no_anchor: bool,

    /// Absolute directory for rolling log files; logging stays off without it.
    #[arg(long)]
    log_dir: Option<PathBuf>,
}

fn demo_types() -> Vec<TypeInfo> {
    vec![
        TypeInfo::new("TelemetryModMenu")
            .in_namespace("Demo")
            .with_method(MethodInfo::new_static(
                "DrawModMenu",
                Visibility::Public,
                || println!("      telemetry: 42 km/s"),
            )),
        TypeInfo::new("Autopilot").in_namespace("Demo").with_method(
            MethodInfo::new_static("Draw", Visibility::NonPublic, || {
                println!("      autopilot: engaged")
            })
            .with_marker(Marker::new("ModMenuEntryAttribute").with_field("MenuName", "Autopilot")),
        ),
    ]
}

inventory::submit! {
    ModuleDescriptor {
        name: "DemoMods",
        types: demo_types,
    }
}

/// Prints every primitive as an indented tree.
#[derive(Default)]
struct TextUi {
    depth: usize,
}

impl TextUi {
    fn line(&self, text: &str) {
        println!("{}{text}", "  ".repeat(self.depth));
    }
}

impl MenuUi for TextUi {
    fn begin_menu(&mut self, label: &str, _enabled: bool) -> Result<bool, UiError> {
        self.line(&format!("[menu] {label}"));
        self.depth += 1;
        Ok(true)
    }

    fn end_menu(&mut self) -> Result<(), UiError> {
        self.depth = self.depth.saturating_sub(1);
        Ok(())
    }

    fn begin_window(&mut self, title: &str, _open: &mut bool) -> Result<bool, UiError> {
        self.line(&format!("[window] {title}"));
        self.depth += 1;
        Ok(true)
    }

    fn end_window(&mut self) -> Result<(), UiError> {
        self.depth = self.depth.saturating_sub(1);
        Ok(())
    }
}

fn host_routine(config: &ModMenuConfig, with_anchor: bool) -> HostRoutine {
    let imgui = |name: &str| MethodRef::new("ImGui", name);
    let mut instructions = vec![Instruction::call(imgui("BeginMainMenuBar"))];
    if with_anchor {
        for menu in ["File", "View"] {
            instructions.extend([
                Instruction::load_string(menu),
                Instruction::call(imgui("BeginMenu")),
                Instruction::op(OpCode::BranchIfFalse),
                Instruction::call(imgui("MenuItem")),
                Instruction::call(config.anchor_call.clone()),
                Instruction::op(OpCode::Nop),
                Instruction::op(OpCode::Nop),
                Instruction::op(OpCode::Nop),
            ]);
        }
    }
    instructions.push(Instruction::call(imgui("EndMainMenuBar")));
    instructions.push(Instruction::op(OpCode::Return));
    HostRoutine::new(config.target_routine.clone(), instructions)
}

fn run_frame(menu: &ModMenu, routine: &HostRoutine, ui: &mut TextUi) {
    let dispatch = menu.config().dispatch_call.clone();
    routine.for_each_call(|method| {
        if *method == dispatch {
            menu.render_menu(&mut *ui);
        } else if method.name == "BeginMenu" {
            ui.line("[menu] <host menu>");
        }
    });
    menu.on_after_gui(ui);
}

fn main() -> ExitCode {
    let args = Args::parse();
    if let Some(log_dir) = &args.log_dir {
        if let Err(err) = init_logging(default_log_level(), log_dir) {
            eprintln!("logging disabled: {err}");
        }
    }

    println!("modmenu_core version={}", modmenu_core::core_version());
    let menu = match ModMenu::new(ModMenuConfig::default()) {
        Ok(menu) => menu.with_source(modmenu_core::LinkedModules),
        Err(err) => {
            eprintln!("invalid config: {err}");
            return ExitCode::FAILURE;
        }
    };
    menu.add_entry("Manual", || println!("      manual entry body"));

    let mut routine = host_routine(menu.config(), !args.no_anchor);
    menu.on_all_mods_loaded(&mut routine);
    println!(
        "splice={} entries={}",
        if menu.injection_failed() { "failed" } else { "ok" },
        menu.entry_names().join(",")
    );

    let mut ui = TextUi::default();
    for frame in 1..=2 {
        println!("-- frame {frame}");
        run_frame(&menu, &routine, &mut ui);
    }

    let reverted = menu.on_unload(&mut routine);
    println!("unloaded reverted={reverted}");
    log::logger().flush();
    ExitCode::SUCCESS
}
