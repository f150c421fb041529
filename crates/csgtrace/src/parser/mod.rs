//! Scene-description language: a line tokenizer feeding an interpreter
//! which builds the scene graph.

mod interpreter;
mod lexer;

pub use interpreter::{load_scene, parse_scene, Interpreter, InterpreterOptions, REQUIRED_VARIABLES};
pub use lexer::{lex_line, Command, Operand};
