//! Concrete configuration components.
//!
//! One component per configuration domain, selected through
//! [`ComponentKind`] and dispatched statically through [`AnyComponent`].

use clap::ValueEnum;
use pillarcfg::SchemaNode;
use serde_json::{Map, Value};

use crate::{
    args::ArgBag,
    ctx::AppContext,
    lifecycle::{ComponentError, ConfigComponent, Lifecycle},
};

/// Management network settings.
pub mod network;

/// Release and update repositories.
pub mod release;

/// Host identity and time synchronisation.
pub mod system;

pub use network::NetworkComponent;
pub use release::ReleaseComponent;
pub use system::SystemComponent;

/// Wrap a domain body as `{name: body}`.
pub(crate) fn pillar(name: &str, body: Value) -> Value {
    let mut map = Map::new();
    map.insert(name.to_string(), body);
    Value::Object(map)
}

/// Known configuration domains.
#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ComponentKind {
    /// Management network.
    Network,
    /// Release and update repositories.
    Release,
    /// Hostname, timezone and NTP.
    System,
}

impl ComponentKind {
    pub const ALL: [ComponentKind; 3] = [
        ComponentKind::Network,
        ComponentKind::Release,
        ComponentKind::System,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            ComponentKind::Network => NetworkComponent::NAME,
            ComponentKind::Release => ReleaseComponent::NAME,
            ComponentKind::System => SystemComponent::NAME,
        }
    }

    /// Fresh component for one invocation.
    pub fn build(&self, ctx: &AppContext) -> AnyComponent {
        match self {
            ComponentKind::Network => AnyComponent::Network(NetworkComponent::new(ctx)),
            ComponentKind::Release => AnyComponent::Release(ReleaseComponent::new(ctx)),
            ComponentKind::System => AnyComponent::System(SystemComponent::new(ctx)),
        }
    }
}

/// Any known component.
pub enum AnyComponent {
    Network(NetworkComponent),
    Release(ReleaseComponent),
    System(SystemComponent),
}

macro_rules! dispatch {
    ($self:ident, $c:ident => $body:expr) => {
        match $self {
            AnyComponent::Network($c) => $body,
            AnyComponent::Release($c) => $body,
            AnyComponent::System($c) => $body,
        }
    };
}

impl ConfigComponent for AnyComponent {
    fn name(&self) -> &'static str {
        dispatch!(self, c => c.name())
    }

    fn lifecycle(&self) -> &Lifecycle {
        dispatch!(self, c => c.lifecycle())
    }

    fn process_inputs(&mut self, args: &ArgBag) -> bool {
        dispatch!(self, c => c.process_inputs(args))
    }

    fn validate(&mut self, schema: &SchemaNode) -> Result<bool, ComponentError> {
        dispatch!(self, c => c.validate(schema))
    }

    fn save(&mut self) -> Result<(), ComponentError> {
        dispatch!(self, c => c.save())
    }
}
