//! FAST market data example.
//!
//! This example builds a market data template from schema definitions,
//! encodes a stream of incremental refresh messages and decodes it again.
//!
//! Set `FAST_MESSAGES` to change the number of messages and `RUST_LOG=debug`
//! to see the codec's message boundaries.

use std::sync::Arc;

use bytes::BytesMut;
use ironfast::prelude::*;
use tracing::{debug, info};

const TEMPLATE_ID: u32 = 1;
const DEFAULT_MESSAGES: u32 = 5;

/// Initializes logging with an env filter defaulting to INFO.
fn init_logging() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::INFO.into()),
        )
        .try_init();
}

fn templates() -> TemplateSet {
    let entry = vec![
        FieldDef::new("MDUpdateAction", ValueType::UInt32)
            .with_id(279)
            .with_operator(OperatorDef::new(Operator::Copy).with_value("0")),
        FieldDef::new("MDEntryPx", ValueType::Decimal)
            .with_id(270)
            .with_split(
                OperatorDef::new(Operator::Default).with_value("-2"),
                OperatorDef::new(Operator::Delta),
            ),
        FieldDef::new("MDEntrySize", ValueType::UInt64)
            .with_id(271)
            .with_operator(OperatorDef::new(Operator::Delta)),
    ];

    TemplateSet::new().with_template(TemplateDef::new(
        TEMPLATE_ID,
        "MDIncRefresh",
        vec![
            FieldDef::new("MessageType", ValueType::Ascii)
                .with_id(35)
                .with_operator(OperatorDef::new(Operator::Constant).with_value("X")),
            FieldDef::new("MsgSeqNum", ValueType::UInt32)
                .with_id(34)
                .with_operator(OperatorDef::new(Operator::Increment)),
            FieldDef::new("SendingTime", ValueType::UInt64)
                .with_id(52)
                .with_operator(OperatorDef::new(Operator::Delta)),
            FieldDef::new("Symbol", ValueType::Ascii)
                .with_id(55)
                .with_operator(OperatorDef::new(Operator::Copy)),
            FieldDef::sequence("MDEntries", entry)
                .with_length(FieldDef::new("NoMDEntries", ValueType::UInt32).with_id(268)),
        ],
    ))
}

fn refresh(seq: u32, levels: &[(i64, u64)]) -> FieldSet {
    let field = |name: &str, id: u32| Arc::new(FieldIdentity::local(name).with_id(id));

    let mut entries = Sequence::new(field("NoMDEntries", 268));
    for &(price, size) in levels {
        entries.push(
            FieldSet::new()
                .with_field(field("MDUpdateAction", 279), 0u32)
                .with_field(field("MDEntryPx", 270), Decimal::new(price, -2))
                .with_field(field("MDEntrySize", 271), size),
        );
    }

    FieldSet::new()
        .with_field(field("MessageType", 35), FieldValue::ascii("X"))
        .with_field(field("MsgSeqNum", 34), seq)
        .with_field(field("SendingTime", 52), 1_790_000_000_000 + u64::from(seq) * 250)
        .with_field(field("Symbol", 55), FieldValue::ascii("ESZ6"))
        .with_field(
            Arc::new(FieldIdentity::local("MDEntries")),
            FieldValue::sequence(entries),
        )
}

fn main() -> anyhow::Result<()> {
    init_logging();

    let count = std::env::var("FAST_MESSAGES")
        .ok()
        .and_then(|n| n.parse().ok())
        .unwrap_or(DEFAULT_MESSAGES);

    let set = templates();
    debug!("templates: {}", serde_json::to_string_pretty(&set)?);
    let registry = Arc::new(set.build()?);
    info!("Registered {} template(s)", registry.len());

    let mut encoder = Encoder::new(Arc::clone(&registry));
    let mut buffer = BytesMut::new();
    for seq in 1..=count {
        let offset = i64::from(seq % 4) * 25;
        let levels = [(512_500 + offset, 10), (512_475 + offset, 25 + u64::from(seq))];
        encoder.encode_message(&mut buffer, TEMPLATE_ID, &refresh(seq, &levels))?;
    }
    info!("Encoded {} messages into {} bytes", count, buffer.len());

    let mut decoder = Decoder::new(registry);
    let mut source = buffer.freeze();
    while let Some(message) = decoder.decode_message(&mut source)? {
        let seq = message.get_field("MsgSeqNum").and_then(FieldValue::as_u32);
        let entries = message.get_field("MDEntries").and_then(FieldValue::as_sequence);
        let best = entries
            .and_then(|s| s.get(0))
            .and_then(|e| e.get_field("MDEntryPx"))
            .and_then(FieldValue::as_decimal);
        info!(
            "Decoded: seq={:?} entries={} best={}",
            seq,
            entries.map_or(0, Sequence::len),
            best.map_or_else(|| "-".to_string(), |px| px.to_string())
        );
    }

    Ok(())
}
