//! Host identity and time synchronisation pillar.

use pillarcfg::SchemaNode;
use serde_json::{Value, json};

use crate::{
    args::{ArgBag, ArgError, Scope},
    components::pillar,
    ctx::AppContext,
    lifecycle::{ComponentError, ConfigComponent, Lifecycle},
};

pub struct SystemComponent {
    lifecycle: Lifecycle,
}

impl SystemComponent {
    pub const NAME: &'static str = "system";

    pub fn new(ctx: &AppContext) -> Self {
        Self {
            lifecycle: Lifecycle::new(Self::NAME, ctx),
        }
    }

    fn build(args: &Scope<'_>) -> Result<Value, ArgError> {
        let hostname = args.require("hostname")?;
        let timezone = args.get("timezone").unwrap_or("UTC");
        let servers = args.list("ntp.servers");
        // NTP stays on by default whenever servers were given.
        let enabled: bool = args
            .parse("ntp.enabled")?
            .unwrap_or(!servers.is_empty());

        Ok(pillar(
            Self::NAME,
            json!({
                "hostname": hostname,
                "timezone": timezone,
                "ntp": {
                    "servers": servers,
                    "enabled": enabled,
                },
            }),
        ))
    }
}

impl ConfigComponent for SystemComponent {
    fn name(&self) -> &'static str {
        Self::NAME
    }

    fn lifecycle(&self) -> &Lifecycle {
        &self.lifecycle
    }

    fn process_inputs(&mut self, args: &ArgBag) -> bool {
        let built = Self::build(&args.scope(Self::NAME));
        self.lifecycle.load_inputs(built)
    }

    fn validate(&mut self, schema: &SchemaNode) -> Result<bool, ComponentError> {
        self.lifecycle.validate(schema)
    }

    fn save(&mut self) -> Result<(), ComponentError> {
        self.lifecycle.save()
    }
}
