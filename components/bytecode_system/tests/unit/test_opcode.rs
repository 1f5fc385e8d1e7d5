//! Opcode and builtin tests

use bytecode_system::{Builtin, LocalSlot, Opcode};

#[test]
fn test_every_builtin_round_trips_by_name() {
    for builtin in Builtin::ALL {
        assert_eq!(Builtin::from_name(builtin.name()), Some(builtin));
    }
}

#[test]
fn test_comparison_builtins_are_binary() {
    for name in ["<", "<=", ">", ">=", "=", "!="] {
        let builtin = Builtin::from_name(name).unwrap();
        assert_eq!(builtin.arity(), 2, "{} should take two arguments", name);
    }
}

#[test]
fn test_net_stack_effect_of_call() {
    let (pops, pushes) = Opcode::Invoke(3, 4).stack_effect();
    assert_eq!(pushes as i32 - pops as i32, -3);

    let (pops, pushes) = Opcode::Invoke(3, 0).stack_effect();
    assert_eq!((pops, pushes), (0, 1));
}

#[test]
fn test_jump_target() {
    assert_eq!(Opcode::Jump(12).jump_target(), Some(12));
    assert_eq!(Opcode::JumpIfFalse(3).jump_target(), Some(3));
    assert_eq!(Opcode::LoadLocal(LocalSlot(3)).jump_target(), None);
}
