//! Release / update repository pillar.

use pillarcfg::SchemaNode;
use serde_json::{Map, Value, json};

use crate::{
    args::{ArgBag, ArgError, Scope},
    components::pillar,
    ctx::AppContext,
    lifecycle::{ComponentError, ConfigComponent, Lifecycle},
};

pub struct ReleaseComponent {
    lifecycle: Lifecycle,
}

impl ReleaseComponent {
    pub const NAME: &'static str = "release";

    pub fn new(ctx: &AppContext) -> Self {
        Self {
            lifecycle: Lifecycle::new(Self::NAME, ctx),
        }
    }

    fn build(args: &Scope<'_>) -> Result<Value, ArgError> {
        let target_build = args.require("target_build")?;
        let release_type = args.get("type").unwrap_or("bundle");
        let enabled: bool = args.parse("update.enabled")?.unwrap_or(false);

        let repos: Map<String, Value> = args
            .prefixed("repo")
            .into_iter()
            .map(|(name, url)| (name.to_string(), Value::String(url.to_string())))
            .collect();

        Ok(pillar(
            Self::NAME,
            json!({
                "target_build": target_build,
                "type": release_type,
                "update": {
                    "enabled": enabled,
                    "repos": repos,
                },
            }),
        ))
    }
}

impl ConfigComponent for ReleaseComponent {
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
