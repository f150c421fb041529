//! Splits one line of a scene file into a `Command`.
//!
//! Lines are whitespace separated. The first character of the first token
//! selects what is being declared:
//! - `!` objects, `*` lights, `?` materials, `/` comments
//! - anything else is a named scalar

use crate::error::{Error, Result};
use crate::scene::{CsgOp, PrimitiveKind, TransformOp};

#[derive(Debug, Clone, PartialEq)]
pub enum Operand {
    Number(f32),
    Pi,
    /// Refers to a previously assigned scalar
    Name(String),
}

impl Operand {
    fn parse(token: &str) -> Operand {
        if let Ok(value) = token.parse::<f32>() {
            Operand::Number(value)
        } else if token == "pi" {
            Operand::Pi
        } else {
            Operand::Name(token.to_owned())
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    CreatePrimitive { name: String, kind: PrimitiveKind },
    Combine { name: String, op: CsgOp, left: String, right: String },
    Transform { name: String, op: TransformOp, params: [Operand; 3] },
    SetMaterial { name: String, material: String },
    Submit { name: String },
    // x y z r g b
    DeclareLight { name: String, values: [Operand; 6] },
    // ka kd ks reflect refract ior shininess r g b
    DeclareMaterial { name: String, values: [Operand; 10] },
    Assign { name: String, value: Operand },
}

impl Command {
    pub fn is_object_command(&self) -> bool {
        matches!(
            self,
            Command::CreatePrimitive { .. }
                | Command::Combine { .. }
                | Command::Transform { .. }
                | Command::SetMaterial { .. }
                | Command::Submit { .. }
        )
    }
}

const ASSIGN: &str = ":=";

/// Returns `None` for blank lines and comments
pub fn lex_line(line: &str, line_number: usize) -> Result<Option<Command>> {
    let tokens: Vec<&str> = line.split_whitespace().collect();
    let Some(first) = tokens.first() else {
        return Ok(None);
    };

    let format_error = |message: String| Error::Format { line: line_number, message };

    if first.starts_with('/') {
        return Ok(None);
    }
    if tokens.len() < 2 {
        return Err(format_error(format!("expected an operator after `{first}`")));
    }

    let operator = tokens[1];
    let expect_len = |expected: usize| {
        if tokens.len() == expected {
            Ok(())
        } else {
            Err(format_error(format!(
                "`{operator}` takes {} operands, found {}",
                expected - 2,
                tokens.len() - 2
            )))
        }
    };

    let declared_name = |sigil: char| {
        let name = &first[sigil.len_utf8()..];
        if name.is_empty() {
            Err(format_error(format!("missing name after `{sigil}`")))
        } else {
            Ok(name.to_owned())
        }
    };

    let command = match first.chars().next() {
        Some('!') => {
            let name = declared_name('!')?;
            match operator {
                ASSIGN if tokens.len() == 3 => {
                    let kind = match tokens[2] {
                        "sphere" => PrimitiveKind::Sphere,
                        "hp" => PrimitiveKind::HalfPlane,
                        other => return Err(format_error(format!("unknown primitive type `{other}`"))),
                    };
                    Command::CreatePrimitive { name, kind }
                }
                ASSIGN => {
                    expect_len(5)?;
                    let op = match tokens[3] {
                        "|" => CsgOp::Union,
                        "&" => CsgOp::Intersection,
                        "-" => CsgOp::Subtraction,
                        other => return Err(format_error(format!("unknown boolean operation `{other}`"))),
                    };
                    Command::Combine { name, op, left: tokens[2].to_owned(), right: tokens[4].to_owned() }
                }
                "?=" => {
                    expect_len(3)?;
                    Command::SetMaterial { name, material: tokens[2].to_owned() }
                }
                "*=" | "+=" => {
                    expect_len(5)?;
                    let op = if operator == "*=" { TransformOp::Scale } else { TransformOp::Translate };
                    let params = [Operand::parse(tokens[2]), Operand::parse(tokens[3]), Operand::parse(tokens[4])];
                    Command::Transform { name, op, params }
                }
                "#x=" | "#y=" | "#z=" => {
                    expect_len(3)?;
                    let op = match operator {
                        "#x=" => TransformOp::RotateX,
                        "#y=" => TransformOp::RotateY,
                        _ => TransformOp::RotateZ,
                    };
                    let params = [Operand::parse(tokens[2]), Operand::Number(0.0), Operand::Number(0.0)];
                    Command::Transform { name, op, params }
                }
                "<=" => {
                    expect_len(2)?;
                    Command::Submit { name }
                }
                other => return Err(format_error(format!("unknown object operator `{other}`"))),
            }
        }
        Some('*') => {
            let name = declared_name('*')?;
            if operator != ASSIGN {
                return Err(format_error(format!("lights are declared with `{ASSIGN}`")));
            }
            expect_len(8)?;
            let values = std::array::from_fn(|i| Operand::parse(tokens[2 + i]));
            Command::DeclareLight { name, values }
        }
        Some('?') => {
            let name = declared_name('?')?;
            if operator != ASSIGN {
                return Err(format_error(format!("materials are declared with `{ASSIGN}`")));
            }
            expect_len(12)?;
            let values = std::array::from_fn(|i| Operand::parse(tokens[2 + i]));
            Command::DeclareMaterial { name, values }
        }
        _ => {
            if operator != ASSIGN {
                return Err(format_error(format!("variables are assigned with `{ASSIGN}`")));
            }
            expect_len(3)?;
            Command::Assign { name: (*first).to_owned(), value: Operand::parse(tokens[2]) }
        }
    };

    Ok(Some(command))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn lex(line: &str) -> Command {
        lex_line(line, 1).unwrap().unwrap()
    }

    #[test]
    fn blank_lines_and_comments() {
        assert_eq!(lex_line("", 1).unwrap(), None);
        assert_eq!(lex_line("   \t ", 1).unwrap(), None);
        assert_eq!(lex_line("/ a comment := 3", 1).unwrap(), None);
    }

    #[test]
    fn object_commands() {
        assert_eq!(
            lex("!ball := sphere"),
            Command::CreatePrimitive { name: "ball".into(), kind: PrimitiveKind::Sphere }
        );
        assert_eq!(
            lex("!cut := ball - floor"),
            Command::Combine {
                name: "cut".into(),
                op: CsgOp::Subtraction,
                left: "ball".into(),
                right: "floor".into()
            }
        );
        assert_eq!(
            lex("!ball #y= pi"),
            Command::Transform {
                name: "ball".into(),
                op: TransformOp::RotateY,
                params: [Operand::Pi, Operand::Number(0.0), Operand::Number(0.0)]
            }
        );
        assert_eq!(
            lex("!ball += 1 -2.5 r"),
            Command::Transform {
                name: "ball".into(),
                op: TransformOp::Translate,
                params: [Operand::Number(1.0), Operand::Number(-2.5), Operand::Name("r".into())]
            }
        );
        assert_eq!(lex("!ball <="), Command::Submit { name: "ball".into() });
        assert_eq!(
            lex("!ball ?= glass"),
            Command::SetMaterial { name: "ball".into(), material: "glass".into() }
        );
    }

    #[test]
    fn declarations() {
        assert!(matches!(lex("*sun := 0 10 0 1 1 1"), Command::DeclareLight { ref name, .. } if name == "sun"));
        assert!(matches!(
            lex("?glass := .1 .2 .3 .1 .8 1.5 20 1 1 1"),
            Command::DeclareMaterial { ref name, ref values } if name == "glass" && values[5] == Operand::Number(1.5)
        ));
        assert_eq!(
            lex("width := 640"),
            Command::Assign { name: "width".into(), value: Operand::Number(640.0) }
        );
    }

    #[test]
    fn malformed_lines() {
        for line in [
            "width",
            "width = 3",
            "!ball := cube",
            "!ball := a ^ b",
            "!ball := a |",
            "!ball *= 1 2",
            "!ball ~= 1",
            "*sun := 0 10 0 1 1",
            "?glass := 1 2 3",
            "! := sphere",
        ] {
            let result = lex_line(line, 12);
            assert!(matches!(result, Err(Error::Format { line: 12, .. })), "{line}: {result:?}");
        }
    }
}
