//! Management network pillar.
//!
//! ```yaml
//! network:
//!   ip: 10.0.0.1
//!   port: 80
//!   netmask: 255.255.255.0
//!   gateway: null
//!   interfaces: [eth0, eth1]
//! ```

use std::net::IpAddr;

use pillarcfg::SchemaNode;
use serde_json::{Value, json};

use crate::{
    args::{ArgBag, ArgError, Scope},
    components::pillar,
    ctx::AppContext,
    lifecycle::{ComponentError, ConfigComponent, Lifecycle},
};

const DEFAULT_NETMASK: &str = "255.255.255.0";

pub struct NetworkComponent {
    lifecycle: Lifecycle,
}

impl NetworkComponent {
    pub const NAME: &'static str = "network";

    pub fn new(ctx: &AppContext) -> Self {
        Self {
            lifecycle: Lifecycle::new(Self::NAME, ctx),
        }
    }

    fn build(args: &Scope<'_>) -> Result<Value, ArgError> {
        let ip: IpAddr = args.parse_required("ip")?;
        let port: u16 = args.parse_required("port")?;
        let netmask = args
            .parse::<IpAddr>("netmask")?
            .map(|m| m.to_string())
            .unwrap_or_else(|| DEFAULT_NETMASK.to_string());
        let gateway: Option<IpAddr> = args.parse("gateway")?;

        Ok(pillar(
            Self::NAME,
            json!({
                "ip": ip.to_string(),
                "port": port,
                "netmask": netmask,
                "gateway": gateway.map(|g| g.to_string()),
                "interfaces": args.list("interfaces"),
            }),
        ))
    }
}

impl ConfigComponent for NetworkComponent {
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

#[cfg(test)]
mod tests {
    use super::*;

    fn build(pairs: &[&str]) -> Result<Value, ArgError> {
        let bag = ArgBag::from_pairs(pairs).unwrap();
        NetworkComponent::build(&bag.scope(NetworkComponent::NAME))
    }

    #[test]
    fn test_build_with_defaults() {
        let record = build(&["network.ip=10.0.0.1", "network.port=80"]).unwrap();
        assert_eq!(
            record,
            json!({"network": {
                "ip": "10.0.0.1",
                "port": 80,
                "netmask": DEFAULT_NETMASK,
                "gateway": null,
                "interfaces": [],
            }})
        );
    }

    #[test]
    fn test_build_full() {
        let record = build(&[
            "network.ip=192.168.1.5",
            "network.port=8080",
            "network.netmask=255.255.0.0",
            "network.gateway=192.168.1.1",
            "network.interfaces=eth0,eth1",
        ])
        .unwrap();
        assert_eq!(record["network"]["gateway"], "192.168.1.1");
        assert_eq!(record["network"]["interfaces"], json!(["eth0", "eth1"]));
    }

    #[test]
    fn test_build_rejects_bad_input() {
        assert_eq!(
            build(&["network.port=80"]),
            Err(ArgError::Missing("network.ip".to_string()))
        );
        assert!(matches!(
            build(&["network.ip=10.0.0.1", "network.port=http"]),
            Err(ArgError::Parse { .. })
        ));
        assert!(matches!(
            build(&["network.ip=10.0.0.300", "network.port=80"]),
            Err(ArgError::Parse { .. })
        ));
    }
}
