//! Operation model for a host's compiled routine.
//!
//! A routine is an ordered list of instructions. Only calls carry enough
//! structure to act as anchors; every other opcode is opaque to the core.

use serde::{Deserialize, Serialize};
use std::fmt::{Display, Formatter};

/// Instruction opcode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OpCode {
    Nop,
    LoadArg,
    LoadConst,
    LoadString,
    Call,
    CallVirt,
    Branch,
    BranchIfFalse,
    Pop,
    Return,
}

impl OpCode {
    /// Whether the opcode invokes a method.
    pub fn is_call(self) -> bool {
        matches!(self, Self::Call | Self::CallVirt)
    }
}

/// Reference to a callable routine, e.g. `ImGui::EndMenu`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct MethodRef {
    pub owner: String,
    pub name: String,
}

impl MethodRef {
    /// Method `name` declared on `owner`.
    pub fn new(owner: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            owner: owner.into(),
            name: name.into(),
        }
    }
}

impl Display for MethodRef {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}::{}", self.owner, self.name)
    }
}

/// Instruction operand.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Operand {
    None,
    Int(i64),
    Str(String),
    Label(usize),
    Method(MethodRef),
}

/// One instruction slot.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Instruction {
    pub opcode: OpCode,
    pub operand: Operand,
}

impl Instruction {
    /// Instruction with an explicit operand.
    pub fn new(opcode: OpCode, operand: Operand) -> Self {
        Self { opcode, operand }
    }

    /// Instruction without an operand.
    pub fn op(opcode: OpCode) -> Self {
        Self::new(opcode, Operand::None)
    }

    /// Direct call to `method`.
    pub fn call(method: MethodRef) -> Self {
        Self::new(OpCode::Call, Operand::Method(method))
    }

    /// Virtual call to `method`.
    pub fn call_virt(method: MethodRef) -> Self {
        Self::new(OpCode::CallVirt, Operand::Method(method))
    }

    /// Pushes a string literal.
    pub fn load_string(value: impl Into<String>) -> Self {
        Self::new(OpCode::LoadString, Operand::Str(value.into()))
    }

    /// Target of a `call`/`callvirt`, `None` for every other instruction.
    pub fn called_method(&self) -> Option<&MethodRef> {
        match (&self.operand, self.opcode.is_call()) {
            (Operand::Method(method), true) => Some(method),
            _ => None,
        }
    }

    /// Whether this is a direct or virtual call to `method`.
    pub fn is_call_to(&self, method: &MethodRef) -> bool {
        self.called_method() == Some(method)
    }
}

/// Named instruction sequence owned by the host.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HostRoutine {
    name: String,
    instructions: Vec<Instruction>,
}

impl HostRoutine {
    /// Routine `name` with its instruction sequence.
    pub fn new(name: impl Into<String>, instructions: Vec<Instruction>) -> Self {
        Self {
            name: name.into(),
            instructions,
        }
    }

    /// Routine name, matched against the configured target.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Instructions in execution order.
    pub fn instructions(&self) -> &[Instruction] {
        &self.instructions
    }

    /// Number of instructions.
    pub fn len(&self) -> usize {
        self.instructions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.instructions.is_empty()
    }

    /// Visits every call target in forward order, the way the host would
    /// reach them when executing the routine straight through.
    pub fn for_each_call(&self, mut visit: impl FnMut(&MethodRef)) {
        for method in self.instructions.iter().filter_map(Instruction::called_method) {
            visit(method);
        }
    }

    pub(crate) fn insert(&mut self, index: usize, instruction: Instruction) {
        self.instructions.insert(index, instruction);
    }

    pub(crate) fn remove(&mut self, index: usize) -> Instruction {
        self.instructions.remove(index)
    }
}
