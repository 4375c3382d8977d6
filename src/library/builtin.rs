//! Code-defined components shipped with the crate.

use crate::core::registry::{BuildContext, ComponentDefinition, DefinitionOrigin};
use crate::core::{Component, Composable, FactoryError, InterfaceSpec, PortType};

type BuildFn = fn(&mut BuildContext<'_>) -> Result<Component, FactoryError>;

/// A definition backed by a Rust function.
pub struct CodeDefinition {
    name: &'static str,
    build: BuildFn,
}

impl CodeDefinition {
    pub const fn new(name: &'static str, build: BuildFn) -> Self {
        CodeDefinition { name, build }
    }
}

impl ComponentDefinition for CodeDefinition {
    fn name(&self) -> &str {
        self.name
    }

    fn origin(&self) -> DefinitionOrigin {
        DefinitionOrigin::Code
    }

    fn instantiate(&self, ctx: &mut BuildContext<'_>) -> Result<Component, FactoryError> {
        (self.build)(ctx)
    }
}

/// All built-in definitions.
pub fn definitions() -> Vec<Box<dyn ComponentDefinition>> {
    vec![
        Box::new(CodeDefinition::new("Motor", motor)),
        Box::new(CodeDefinition::new("Servo", servo)),
        Box::new(CodeDefinition::new("Brain", brain)),
        Box::new(CodeDefinition::new("RectBeam", rect_beam)),
        Box::new(CodeDefinition::new("ServoMount", servo_mount)),
    ]
}

fn motor(_ctx: &mut BuildContext<'_>) -> Result<Component, FactoryError> {
    let mut c = Component::new("Motor");
    c.add_parameter("voltage", 12);
    c.add_parameter("max_rpm", 200);
    c.add_interface("shaft", InterfaceSpec::port(PortType::shaft()));
    c.add_interface("power", InterfaceSpec::port(PortType::electrical()));
    c.add_composable(
        "code",
        Composable::code("arduino")
            .with_snippet("setup", "pinMode(MOTOR_PIN, OUTPUT);")
            .with_snippet("loop", "analogWrite(MOTOR_PIN, speed);")
            .with_binding("on_drive", "Motor", "drive"),
    );
    c.add_composable("electrical", Composable::electrical(["vcc", "gnd"]));
    Ok(c)
}

fn servo(_ctx: &mut BuildContext<'_>) -> Result<Component, FactoryError> {
    let mut c = Component::new("Servo");
    c.add_parameter("angle", 90);
    c.add_parameter("min_pulse", 544);
    c.add_parameter("max_pulse", 2400);
    c.add_interface("horn", InterfaceSpec::port(PortType::shaft()));
    c.add_interface("signal", InterfaceSpec::port(PortType::data()));
    c.add_interface("mount", InterfaceSpec::port(PortType::mount()));
    c.add_composable(
        "code",
        Composable::code("arduino")
            .with_snippet("setup", "servo.attach(SERVO_PIN);")
            .with_binding("on_angle", "Servo", "write_angle"),
    );
    c.add_composable("electrical", Composable::electrical(["signal", "vcc", "gnd"]));
    Ok(c)
}

fn brain(_ctx: &mut BuildContext<'_>) -> Result<Component, FactoryError> {
    let mut c = Component::new("Brain");
    c.add_parameter("board", "uno");
    c.add_interface("pwm", InterfaceSpec::port(PortType::data()));
    c.add_interface("power", InterfaceSpec::port(PortType::electrical()));
    c.add_composable("code", Composable::code("arduino"));
    c.add_composable(
        "electrical",
        Composable::electrical(["d3", "d5", "d6", "vin", "gnd"]),
    );
    Ok(c)
}

fn rect_beam(_ctx: &mut BuildContext<'_>) -> Result<Component, FactoryError> {
    let mut c = Component::new("RectBeam");
    c.add_parameter("length", 100.0);
    c.add_parameter("width", 20.0);
    c.add_parameter("depth", 10.0);
    c.add_interface("topedge", InterfaceSpec::port(PortType::edge()));
    c.add_interface("botedge", InterfaceSpec::port(PortType::edge()));
    c.add_composable(
        "graph",
        Composable::GraphComposable {
            faces: vec!["top".into(), "bottom".into(), "left".into(), "right".into()],
            edges: vec!["topedge".into(), "botedge".into()],
        },
    );
    Ok(c)
}

fn servo_mount(ctx: &mut BuildContext<'_>) -> Result<Component, FactoryError> {
    let mut c = Component::new("ServoMount");
    c.add_parameter("offset", 0.0);
    c.add_subcomponent("servo", ctx.build("Servo")?)?;
    c.add_subcomponent("beam", ctx.build("RectBeam")?)?;
    c.constrain_parameter("beam", "width", 23.0)?;
    c.inherit_interface("horn", "servo", "horn")?;
    c.inherit_interface("signal", "servo", "signal")?;
    c.inherit_interface("edge", "beam", "topedge")?;
    c.add_composable("graph", Composable::graph(["mount_plate"]));
    Ok(c)
}
