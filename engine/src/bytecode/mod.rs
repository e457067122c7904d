// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! AST lowering and the register bytecode it produces (`spec.md` §4.4).

pub mod block;
pub mod generator;
pub mod opcode;
pub mod scope;

pub use block::BytecodeBlock;
pub use generator::BytecodeGenerator;
pub use opcode::Instruction;
