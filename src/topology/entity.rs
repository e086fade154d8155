//! A single entity in the topology diagram.
//!
//! Entities are routers, edge routers, clients, brokers, or groups of clients
//! merged into one visual node. Each entity knows how to title itself and how
//! to build its tooltip; routers need a round trip to the management source
//! for the tooltip, everything else answers from local state.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fmt;

use super::types::NodeType;
use crate::discovery::{AttributeRequest, FetchError, ManagementSource};

const CONSOLE_IDENTIFIER: &str = "Dispatch console";
const ARTEMIS_PRODUCT: &str = "apache-activemq-artemis";
const QPID_CPP_PRODUCT: &str = "qpid-cpp";

/// What kind of peer sits behind an entity, decided once at construction
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Capability {
    /// A management console connection
    Console,
    /// An Artemis broker
    Artemis,
    #[default]
    None,
}

impl Capability {
    /// Classify an entity from its node type and connection properties
    pub fn classify(node_type: NodeType, properties: &Map<String, Value>) -> Self {
        if properties.get("console_identifier").and_then(Value::as_str) == Some(CONSOLE_IDENTIFIER) {
            return Capability::Console;
        }
        let broker_role = matches!(node_type, NodeType::RouteContainer | NodeType::OnDemand);
        if broker_role && product(properties) == Some(ARTEMIS_PRODUCT) {
            return Capability::Artemis;
        }
        Capability::None
    }
}

/// Direction of the links attached to a client
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ConnectionDirection {
    In,
    Out,
    Both,
}

/// Product name advertised in connection properties.
///
/// Only a non-empty string counts; any other value means no product.
pub(crate) fn product(properties: &Map<String, Value>) -> Option<&str> {
    properties
        .get("product")
        .and_then(Value::as_str)
        .filter(|name| !name.is_empty())
}

/// Coerce a stored `fixed` flag to a boolean.
///
/// Numbers are fixed when non-zero, strings when they parse to a non-zero
/// number, booleans as-is. Everything else is not fixed.
pub fn coerce_fixed(value: &Value) -> bool {
    match value {
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().map_or(false, |v| v != 0.0),
        Value::String(s) => s.trim().parse::<f64>().map_or(false, |v| v != 0.0 && !v.is_nan()),
        _ => false,
    }
}

/// Render an attribute value as display text
fn value_text(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Null => String::new(),
        other => other.to_string(),
    }
}

/// Everything needed to construct an [`Entity`]
#[derive(Debug, Clone)]
pub struct EntityInit {
    pub key: String,
    pub name: String,
    pub node_type: NodeType,
    pub properties: Map<String, Value>,
    pub x: f64,
    pub y: f64,
    pub sequence_index: usize,
    pub result_index: Option<usize>,
    pub fixed: bool,
    pub container: String,
}

/// One participant in the topology diagram
#[derive(Debug, Clone, PartialEq)]
pub struct Entity {
    /// Discovery identifier (a router's management address)
    pub key: String,
    /// Display and lookup name, unique within a collection
    pub name: String,
    pub node_type: NodeType,
    pub properties: Map<String, Value>,
    /// Name of the owning router
    pub router_id: String,
    pub x: f64,
    pub y: f64,
    /// Previous position, used by the layout to detect motion
    pub px: f64,
    pub py: f64,
    pub lon: Option<f64>,
    pub lat: Option<f64>,
    /// Short id within the current rendering pass
    pub sequence_index: usize,
    pub result_index: Option<usize>,
    /// Position is pinned and excluded from the simulation
    pub fixed: bool,
    pub cls: String,
    /// Connection this entity was derived from
    pub container: String,
    /// Client connections merged into this node
    pub normals: Option<Vec<Entity>>,
    pub highlighted: bool,
    pub cdir: Option<ConnectionDirection>,
    pub host: Option<String>,
    capability: Capability,
}

impl Entity {
    pub fn new(init: EntityInit, router_id: String) -> Self {
        let capability = Capability::classify(init.node_type, &init.properties);
        Self {
            key: init.key,
            name: init.name,
            node_type: init.node_type,
            properties: init.properties,
            router_id,
            x: init.x,
            y: init.y,
            px: init.x,
            py: init.y,
            lon: None,
            lat: None,
            sequence_index: init.sequence_index,
            result_index: init.result_index,
            fixed: init.fixed,
            cls: String::new(),
            container: init.container,
            normals: None,
            highlighted: false,
            cdir: None,
            host: None,
            capability,
        }
    }

    pub fn capability(&self) -> Capability {
        self.capability
    }

    pub fn is_console(&self) -> bool {
        self.capability == Capability::Console
    }

    pub fn is_artemis(&self) -> bool {
        self.capability == Capability::Artemis
    }

    /// Number of merged client connections, 0 when this is not a group
    pub fn normals_count(&self) -> usize {
        self.normals.as_ref().map_or(0, Vec::len)
    }

    pub fn radius(&self) -> f64 {
        self.node_type.radius()
    }

    /// Human-readable title, suffixed with ` x N` for merged client groups
    pub fn title(&self) -> String {
        let count = self.normals_count();
        let suffix = if count > 1 { format!(" x {}", count) } else { String::new() };

        if self.is_console() {
            return format!("Dispatch console{}", suffix);
        }
        if self.is_artemis() {
            return format!("Broker - Artemis{}", suffix);
        }
        if product(&self.properties) == Some(QPID_CPP_PRODUCT) {
            return format!("Broker - qpid-cpp{}", suffix);
        }
        if self.node_type == NodeType::Edge {
            return "Edge Router".to_string();
        }
        match self.cdir {
            Some(ConnectionDirection::In) => return format!("Sender{}", suffix),
            Some(ConnectionDirection::Out) => return format!("Receiver{}", suffix),
            Some(ConnectionDirection::Both) => return format!("Sender/Receiver{}", suffix),
            None => {}
        }
        match self.node_type {
            NodeType::Normal => format!("client{}", suffix),
            NodeType::OnDemand => "broker".to_string(),
            _ => product(&self.properties).unwrap_or_default().to_string(),
        }
    }

    /// Build the tooltip for this entity.
    ///
    /// Clients and edge routers answer immediately. Routers first ask `source`
    /// for their listener and router attributes; a failed fetch is returned
    /// as-is. Concurrent calls for the same entity each fetch separately.
    pub async fn tool_tip<S>(&self, source: &S) -> Result<ToolTip, FetchError>
    where
        S: ManagementSource + ?Sized,
    {
        if self.node_type.is_local_tooltip() {
            Ok(self.client_tool_tip())
        } else {
            self.router_tool_tip(source).await
        }
    }

    fn client_tool_tip(&self) -> ToolTip {
        let mut tip = ToolTip::default();
        tip.push("Type", self.title());
        let count = self.normals_count();
        if count < 2 {
            tip.push("Host", self.host.clone().unwrap_or_default());
        } else {
            tip.push("Count", count.to_string());
        }
        tip
    }

    async fn router_tool_tip<S>(&self, source: &S) -> Result<ToolTip, FetchError>
    where
        S: ManagementSource + ?Sized,
    {
        let requests = [
            AttributeRequest::new("listener", &["role", "port", "http"]),
            AttributeRequest::new("router", &["name", "version", "hostName"]),
        ];
        source.ensure_entities(&self.key, &requests).await?;

        let missing = |entity: &str| FetchError::MissingEntity {
            key: self.key.clone(),
            entity: entity.to_string(),
        };
        let node = source.node_info(&self.key).ok_or_else(|| missing("router"))?;
        let router = node
            .get("router")
            .and_then(|results| results.first_record())
            .ok_or_else(|| missing("router"))?;
        let listeners = node.get("listener").ok_or_else(|| missing("listener"))?;

        let mut tip = ToolTip::default();
        tip.push("Router", router.get("name").map(value_text).unwrap_or_default());
        if let Some(host_name) = router.get("hostName").map(value_text).filter(|h| !h.is_empty()) {
            tip.push("Host Name", host_name);
        }
        tip.push("Version", router.get("version").map(value_text).unwrap_or_default());

        let mut ports: Vec<String> = listeners
            .records()
            .iter()
            .filter(|listener| listener.get("role").and_then(Value::as_str) == Some("normal"))
            .map(|listener| listener.get("port").map(value_text).unwrap_or_default())
            .collect();
        ports.sort_by(|a, b| match (a.parse::<u32>(), b.parse::<u32>()) {
            (Ok(a), Ok(b)) => a.cmp(&b),
            _ => a.cmp(b),
        });
        if !ports.is_empty() {
            tip.push("Ports", ports.join(", "));
        }
        Ok(tip)
    }
}

/// Tooltip text as ordered label/value rows
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ToolTip {
    rows: Vec<(String, String)>,
}

impl ToolTip {
    pub fn push(&mut self, label: &str, value: String) {
        self.rows.push((label.to_string(), value));
    }

    pub fn rows(&self) -> &[(String, String)] {
        &self.rows
    }

    /// Value of the first row with `label`
    pub fn get(&self, label: &str) -> Option<&str> {
        self.rows
            .iter()
            .find(|(l, _)| l == label)
            .map(|(_, value)| value.as_str())
    }
}

impl fmt::Display for ToolTip {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, (label, value)) in self.rows.iter().enumerate() {
            if i > 0 {
                writeln!(f)?;
            }
            write!(f, "{}: {}", label, value)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::discovery::{DiscoverySnapshot, NodeInfo, SnapshotSource};
    use async_trait::async_trait;
    use serde_json::json;
    use std::sync::Mutex;

    fn props(value: Value) -> Map<String, Value> {
        value.as_object().cloned().unwrap_or_default()
    }

    fn entity(node_type: NodeType, properties: Map<String, Value>) -> Entity {
        let init = EntityInit {
            key: "amqp:/_topo/0/R1/$management".to_string(),
            name: "R1".to_string(),
            node_type,
            properties,
            x: 10.0,
            y: 20.0,
            sequence_index: 0,
            result_index: None,
            fixed: false,
            container: "R1".to_string(),
        };
        Entity::new(init, "R1".to_string())
    }

    fn group(mut e: Entity, n: usize) -> Entity {
        e.normals = Some(vec![e.clone(); n]);
        e
    }

    #[test]
    fn test_capability_classification() {
        let console = props(json!({"console_identifier": "Dispatch console"}));
        assert_eq!(Capability::classify(NodeType::Normal, &console), Capability::Console);

        let artemis = props(json!({"product": "apache-activemq-artemis"}));
        assert_eq!(Capability::classify(NodeType::RouteContainer, &artemis), Capability::Artemis);
        assert_eq!(Capability::classify(NodeType::OnDemand, &artemis), Capability::Artemis);
        // only broker roles count as Artemis
        assert_eq!(Capability::classify(NodeType::Normal, &artemis), Capability::None);

        assert_eq!(Capability::classify(NodeType::InterRouter, &Map::new()), Capability::None);
    }

    #[test]
    fn test_coerce_fixed() {
        assert!(coerce_fixed(&json!(1)));
        assert!(coerce_fixed(&json!("1")));
        assert!(coerce_fixed(&json!(true)));
        assert!(coerce_fixed(&json!(3)));
        assert!(!coerce_fixed(&json!(0)));
        assert!(!coerce_fixed(&json!("0")));
        assert!(!coerce_fixed(&json!("")));
        assert!(!coerce_fixed(&json!("true")));
        assert!(!coerce_fixed(&json!(false)));
        assert!(!coerce_fixed(&Value::Null));
    }

    #[test]
    fn test_title_console_group() {
        let console = props(json!({"console_identifier": "Dispatch console"}));
        let e = group(entity(NodeType::Normal, console), 3);
        assert_eq!(e.title(), "Dispatch console x 3");
    }

    #[test]
    fn test_title_precedence() {
        let artemis = props(json!({"product": "apache-activemq-artemis"}));
        assert_eq!(entity(NodeType::RouteContainer, artemis).title(), "Broker - Artemis");

        let qpid = props(json!({"product": "qpid-cpp"}));
        assert_eq!(group(entity(NodeType::RouteContainer, qpid), 2).title(), "Broker - qpid-cpp x 2");

        // edge routers never get a count suffix
        assert_eq!(group(entity(NodeType::Edge, Map::new()), 4).title(), "Edge Router");

        let mut sender = entity(NodeType::Normal, Map::new());
        sender.cdir = Some(ConnectionDirection::In);
        assert_eq!(sender.title(), "Sender");
        sender.cdir = Some(ConnectionDirection::Out);
        assert_eq!(sender.title(), "Receiver");
        sender.cdir = Some(ConnectionDirection::Both);
        assert_eq!(group(sender, 5).title(), "Sender/Receiver x 5");

        assert_eq!(group(entity(NodeType::Normal, Map::new()), 2).title(), "client x 2");
        assert_eq!(entity(NodeType::Normal, Map::new()).title(), "client");
        assert_eq!(group(entity(NodeType::OnDemand, Map::new()), 2).title(), "broker");

        let product = props(json!({"product": "qpid-dispatch-router"}));
        assert_eq!(entity(NodeType::InterRouter, product).title(), "qpid-dispatch-router");
        assert_eq!(entity(NodeType::InterRouter, Map::new()).title(), "");
    }

    #[test]
    fn test_product_must_be_a_non_empty_string() {
        assert_eq!(product(&props(json!({"product": "qpid-cpp"}))), Some("qpid-cpp"));
        assert_eq!(product(&props(json!({"product": ""}))), None);
        assert_eq!(product(&props(json!({"product": 7}))), None);
        assert_eq!(product(&props(json!({"product": null}))), None);

        let numeric = props(json!({"product": 7}));
        assert_eq!(entity(NodeType::InterRouter, numeric.clone()).title(), "");
        assert_eq!(Capability::classify(NodeType::RouteContainer, &numeric), Capability::None);
    }

    #[test]
    fn test_single_normal_has_no_suffix() {
        assert_eq!(group(entity(NodeType::Normal, Map::new()), 1).title(), "client");
    }

    #[test]
    fn test_radius() {
        assert_eq!(entity(NodeType::InterRouter, Map::new()).radius(), 28.0);
        assert_eq!(entity(NodeType::Edge, Map::new()).radius(), 20.0);
        assert_eq!(entity(NodeType::Normal, Map::new()).radius(), 15.0);
    }

    fn router_snapshot() -> DiscoverySnapshot {
        serde_json::from_value(json!({
            "amqp:/_topo/0/R1/$management": {
                "router": {
                    "attributeNames": ["name", "version", "hostName"],
                    "results": [["R1", "1.19.0", "r1.example.com"]]
                },
                "listener": {
                    "attributeNames": ["role", "port", "http"],
                    "results": [
                        ["normal", "5673", false],
                        ["inter-router", "5680", false],
                        ["normal", "5672", true]
                    ]
                }
            }
        }))
        .unwrap()
    }

    /// Answers from a snapshot and records every fetch it is asked for
    struct RecordingSource {
        inner: SnapshotSource,
        fetches: Mutex<Vec<(String, Vec<AttributeRequest>)>>,
    }

    impl RecordingSource {
        fn new(snapshot: DiscoverySnapshot) -> Self {
            Self {
                inner: SnapshotSource::new(snapshot),
                fetches: Mutex::new(Vec::new()),
            }
        }

        fn fetches(&self) -> Vec<(String, Vec<AttributeRequest>)> {
            self.fetches.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl ManagementSource for RecordingSource {
        async fn ensure_entities(&self, key: &str, requests: &[AttributeRequest]) -> Result<(), FetchError> {
            self.fetches.lock().unwrap().push((key.to_string(), requests.to_vec()));
            self.inner.ensure_entities(key, requests).await
        }

        fn node_info(&self, key: &str) -> Option<NodeInfo> {
            self.inner.node_info(key)
        }
    }

    #[tokio::test]
    async fn test_router_tool_tip_requests_listener_and_router_attributes() {
        let source = RecordingSource::new(router_snapshot());
        entity(NodeType::InterRouter, Map::new()).tool_tip(&source).await.unwrap();

        assert_eq!(
            source.fetches(),
            vec![(
                "amqp:/_topo/0/R1/$management".to_string(),
                vec![
                    AttributeRequest::new("listener", &["role", "port", "http"]),
                    AttributeRequest::new("router", &["name", "version", "hostName"]),
                ],
            )]
        );
    }

    #[tokio::test]
    async fn test_concurrent_router_tool_tips_each_fetch() {
        let source = RecordingSource::new(router_snapshot());
        let router = entity(NodeType::InterRouter, Map::new());

        let (first, second) = tokio::join!(router.tool_tip(&source), router.tool_tip(&source));
        assert_eq!(first.unwrap().get("Router"), Some("R1"));
        assert_eq!(second.unwrap().get("Router"), Some("R1"));
        assert_eq!(source.fetches().len(), 2);
    }

    #[tokio::test]
    async fn test_local_tool_tips_never_fetch() {
        let source = RecordingSource::new(router_snapshot());

        entity(NodeType::Normal, Map::new()).tool_tip(&source).await.unwrap();
        group(entity(NodeType::Normal, Map::new()), 3).tool_tip(&source).await.unwrap();
        let tip = entity(NodeType::Edge, Map::new()).tool_tip(&source).await.unwrap();
        assert_eq!(tip.get("Type"), Some("Edge Router"));

        assert!(source.fetches().is_empty());
    }

    #[tokio::test]
    async fn test_client_tool_tip() {
        let source = SnapshotSource::default();

        let mut client = entity(NodeType::Normal, Map::new());
        client.host = Some("127.0.0.1:45678".to_string());
        let tip = client.tool_tip(&source).await.unwrap();
        assert_eq!(tip.get("Type"), Some("client"));
        assert_eq!(tip.get("Host"), Some("127.0.0.1:45678"));

        let tip = group(client, 4).tool_tip(&source).await.unwrap();
        assert_eq!(tip.get("Count"), Some("4"));
        assert_eq!(tip.get("Host"), None);
        assert_eq!(tip.to_string(), "Type: client x 4\nCount: 4");
    }

    #[tokio::test]
    async fn test_router_tool_tip() {
        let source = SnapshotSource::new(router_snapshot());
        let tip = entity(NodeType::InterRouter, Map::new()).tool_tip(&source).await.unwrap();

        assert_eq!(tip.get("Router"), Some("R1"));
        assert_eq!(tip.get("Host Name"), Some("r1.example.com"));
        assert_eq!(tip.get("Version"), Some("1.19.0"));
        assert_eq!(tip.get("Ports"), Some("5672, 5673"));
        assert_eq!(tip.rows().len(), 4);
    }

    #[tokio::test]
    async fn test_router_tool_tip_propagates_fetch_failure() {
        let source = SnapshotSource::default();
        let err = entity(NodeType::InterRouter, Map::new()).tool_tip(&source).await.unwrap_err();
        assert!(matches!(err, FetchError::Unavailable { .. }));
    }
}
