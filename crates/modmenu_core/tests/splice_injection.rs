mod support;

use modmenu_core::{
    HostRoutine, Instruction, MethodRef, ModMenu, ModMenuConfig, OpCode, SpliceError,
};
use support::{imgui, menu_bar_routine, run_host_frame, RecordingUi};

fn service() -> ModMenu {
    ModMenu::new(ModMenuConfig::default()).expect("default config")
}

fn dispatch_call() -> Instruction {
    Instruction::call(MethodRef::new("ModMenu", "RenderMenu"))
}

fn end_menu_positions(routine: &HostRoutine) -> Vec<usize> {
    routine
        .instructions()
        .iter()
        .enumerate()
        .filter(|(_, instruction)| instruction.is_call_to(&imgui("EndMenu")))
        .map(|(index, _)| index)
        .collect()
}

#[test]
fn single_anchor_gets_dispatch_four_slots_later() {
    let menu = service();
    let mut routine = menu_bar_routine(&["File"]);
    let anchor = end_menu_positions(&routine)[0];

    menu.patch(&mut routine).expect("anchor present");

    assert!(!menu.injection_failed());
    assert_eq!(routine.instructions()[anchor + 4], dispatch_call());
    assert_eq!(
        routine.instructions()[anchor + 5],
        Instruction::call(imgui("EndMainMenuBar"))
    );
}

#[test]
fn last_anchor_in_forward_order_is_used() {
    let menu = service();
    let mut routine = menu_bar_routine(&["File", "Edit", "View"]);
    let original_len = routine.len();
    let last_anchor = *end_menu_positions(&routine).last().expect("three anchors");

    menu.patch(&mut routine).expect("anchor present");

    assert_eq!(routine.len(), original_len + 1);
    let dispatch_positions: Vec<usize> = routine
        .instructions()
        .iter()
        .enumerate()
        .filter(|(_, instruction)| **instruction == dispatch_call())
        .map(|(index, _)| index)
        .collect();
    assert_eq!(dispatch_positions, vec![last_anchor + 4]);
}

#[test]
fn callvirt_anchor_is_recognized() {
    let menu = service();
    let mut routine = HostRoutine::new(
        "DrawMenuBar",
        vec![
            Instruction::call_virt(imgui("EndMenu")),
            Instruction::op(OpCode::Nop),
            Instruction::op(OpCode::Nop),
            Instruction::op(OpCode::Nop),
            Instruction::op(OpCode::Return),
        ],
    );

    menu.patch(&mut routine).expect("callvirt anchor counts");
    assert_eq!(routine.instructions()[4], dispatch_call());
}

#[test]
fn missing_anchor_sets_failure_flag_and_leaves_routine_untouched() {
    let menu = service();
    let mut routine = menu_bar_routine(&[]);
    let before = routine.clone();

    let err = menu.patch(&mut routine).expect_err("no EndMenu call present");

    assert!(matches!(err, SpliceError::AnchorNotFound { .. }));
    assert!(menu.injection_failed());
    assert_eq!(routine, before);
}

#[test]
fn anchor_operand_outside_a_call_does_not_count() {
    let menu = service();
    let mut routine = HostRoutine::new(
        "DrawMenuBar",
        vec![
            Instruction::new(
                OpCode::LoadConst,
                modmenu_core::Operand::Method(imgui("EndMenu")),
            ),
            Instruction::op(OpCode::Return),
        ],
    );

    assert!(menu.patch(&mut routine).is_err());
    assert!(menu.injection_failed());
}

#[test]
fn anchor_too_close_to_routine_end_fails() {
    let menu = service();
    let mut routine = HostRoutine::new(
        "DrawMenuBar",
        vec![
            Instruction::call(imgui("EndMenu")),
            Instruction::op(OpCode::Return),
        ],
    );

    let err = menu.patch(&mut routine).expect_err("splice index out of range");
    assert!(matches!(err, SpliceError::SpliceIndexOutOfRange { index: 4, len: 2, .. }));
    assert!(menu.injection_failed());
    assert_eq!(routine.len(), 2);
}

#[test]
fn other_routines_are_rejected() {
    let menu = service();
    let mut routine = HostRoutine::new("DrawStatusBar", menu_bar_routine(&["File"]).instructions().to_vec());

    let err = menu.patch(&mut routine).expect_err("wrong routine");
    assert!(matches!(err, SpliceError::RoutineMismatch { .. }));
    assert!(menu.injection_failed());
}

#[test]
fn unload_reverts_the_splice() {
    let menu = service();
    let original = menu_bar_routine(&["File", "View"]);
    let mut routine = original.clone();

    menu.on_all_mods_loaded(&mut routine);
    assert_ne!(routine, original);

    assert_eq!(menu.on_unload(&mut routine), 1);
    assert_eq!(routine, original);
    assert_eq!(menu.on_unload(&mut routine), 0);
}

#[test]
fn repeated_load_events_splice_only_once() {
    let menu = service();
    menu.add_entry("A", || {});
    let mut routine = menu_bar_routine(&["File"]);

    menu.on_all_mods_loaded(&mut routine);
    let patched = routine.clone();
    menu.on_all_mods_loaded(&mut routine);
    menu.patch(&mut routine).expect("first outcome is replayed");

    assert_eq!(routine, patched);
    let mut ui = RecordingUi::new();
    assert_eq!(run_host_frame(&routine, &menu, &mut ui), 1);
    assert_eq!(ui.opened_menus(), vec!["Mods", "A"]);
}

#[test]
fn failed_splice_is_not_retried() {
    let menu = service();
    let mut without_anchor = menu_bar_routine(&[]);
    menu.patch(&mut without_anchor).expect_err("no EndMenu call present");

    let mut with_anchor = menu_bar_routine(&["File"]);
    let untouched = with_anchor.clone();
    let err = menu
        .patch(&mut with_anchor)
        .expect_err("first failure is replayed");

    assert!(matches!(err, SpliceError::AnchorNotFound { .. }));
    assert_eq!(with_anchor, untouched);
    assert!(menu.injection_failed());
}
