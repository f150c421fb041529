use std::{collections::HashMap, f32::consts::PI, path::Path};

use tracing::{debug, info};

use crate::error::{Error, Result};
use crate::geometry::Vec3;
use crate::scene::{AmbientLight, Camera, LightSource, Material, Scene, SceneBuilder};
use crate::settings::NameResolution;

use super::lexer::{lex_line, Command, Operand};

pub const REQUIRED_VARIABLES: [&str; 15] = [
    "width", "height",
    "lookat_x", "lookat_y", "lookat_z",
    "eyepos_x", "eyepos_y", "eyepos_z",
    "ambient_r", "ambient_g", "ambient_b",
    "ambient_int_r", "ambient_int_g", "ambient_int_b",
    "raydepth",
];

#[derive(Debug, Clone, Copy, Default)]
pub struct InterpreterOptions {
    pub name_resolution: NameResolution,
}

/// Applies commands in file order. Object commands after the root is
/// submitted are ignored; declarations and scalars are still accepted.
#[derive(Debug)]
pub struct Interpreter {
    builder: SceneBuilder,
    variables: HashMap<String, f32>,
}

impl Interpreter {
    pub fn new(options: InterpreterOptions) -> Self {
        Interpreter {
            builder: SceneBuilder::new(options.name_resolution),
            variables: HashMap::new(),
        }
    }

    pub fn variable(&self, name: &str) -> Option<f32> {
        self.variables.get(name).copied()
    }

    pub fn apply(&mut self, command: Command, line: usize) -> Result<()> {
        if command.is_object_command() && self.builder.is_locked() {
            debug!(line, "object tree already submitted, ignoring");
            return Ok(());
        }

        match command {
            Command::CreatePrimitive { name, kind } => {
                self.builder.create_primitive(&name, kind);
            }
            Command::Combine { name, op, left, right } => {
                self.builder.combine(&name, op, &left, &right, line)?;
            }
            Command::Transform { name, op, params } => {
                let [x, y, z] = params;
                let params = Vec3(self.value(x, line)?, self.value(y, line)?, self.value(z, line)?);
                self.builder.transform(&name, op, params, line)?;
            }
            Command::SetMaterial { name, material } => {
                self.builder.set_material(&name, &material, line)?;
            }
            Command::Submit { name } => {
                self.builder.submit(&name, line)?;
            }
            Command::DeclareLight { name, values } => {
                let [x, y, z, r, g, b] = self.values(values, line)?;
                self.builder.declare_light(&name, LightSource {
                    position: Vec3(x, y, z),
                    color: Vec3(r, g, b),
                });
            }
            Command::DeclareMaterial { name, values } => {
                let [ambient, diffuse, specular, reflectivity, refractivity, refractive_index, shininess, r, g, b] =
                    self.values(values, line)?;
                self.builder.declare_material(&name, Material {
                    ambient,
                    diffuse,
                    specular,
                    reflectivity,
                    refractivity,
                    refractive_index,
                    shininess,
                    color: Vec3(r, g, b),
                });
            }
            Command::Assign { name, value } => {
                let value = self.value(value, line)?;
                self.variables.insert(name, value);
            }
        }
        Ok(())
    }

    fn value(&self, operand: Operand, line: usize) -> Result<f32> {
        match operand {
            Operand::Number(value) => Ok(value),
            Operand::Pi => Ok(PI),
            Operand::Name(name) => self.variables.get(&name).copied().ok_or_else(|| Error::Format {
                line,
                message: format!("`{name}` is neither a number nor an assigned variable"),
            }),
        }
    }

    fn values<const N: usize>(&self, operands: [Operand; N], line: usize) -> Result<[f32; N]> {
        let mut out = [0.0; N];
        for (slot, operand) in out.iter_mut().zip(operands) {
            *slot = self.value(operand, line)?;
        }
        Ok(out)
    }

    fn required(&self, name: &str) -> Result<f32> {
        self.variable(name).ok_or_else(|| Error::MissingVariable(name.to_owned()))
    }

    fn required_count(&self, name: &str) -> Result<u32> {
        let value = self.required(name)?;
        if value.is_finite() && value >= 1.0 && value.fract() == 0.0 && value <= u32::MAX as f32 {
            Ok(value as u32)
        } else {
            Err(Error::InvalidSetting(format!("`{name}` must be a positive integer, got {value}")))
        }
    }

    pub fn finish(self) -> Result<Scene> {
        for name in REQUIRED_VARIABLES {
            self.required(name)?;
        }

        let width = self.required_count("width")? as usize;
        let height = self.required_count("height")? as usize;
        let ray_depth = self.required_count("raydepth")?;

        let eye = Vec3(self.required("eyepos_x")?, self.required("eyepos_y")?, self.required("eyepos_z")?);
        let look_at = Vec3(self.required("lookat_x")?, self.required("lookat_y")?, self.required("lookat_z")?);
        let camera = Camera::look_at(eye, look_at, width, height)?;

        let ambient = AmbientLight {
            color: Vec3(self.required("ambient_r")?, self.required("ambient_g")?, self.required("ambient_b")?),
            intensity: Vec3(
                self.required("ambient_int_r")?,
                self.required("ambient_int_g")?,
                self.required("ambient_int_b")?,
            ),
        };

        self.builder.build(camera, ambient, ray_depth)
    }
}

pub fn parse_scene(source: &str, options: InterpreterOptions) -> Result<Scene> {
    let mut interpreter = Interpreter::new(options);
    for (index, line) in source.lines().enumerate() {
        if let Some(command) = lex_line(line, index + 1)? {
            interpreter.apply(command, index + 1)?;
        }
    }
    interpreter.finish()
}

pub fn load_scene(path: &Path, options: InterpreterOptions) -> Result<Scene> {
    info!("loading scene from {}", path.display());
    let source = std::fs::read_to_string(path)?;
    parse_scene(&source, options)
}
