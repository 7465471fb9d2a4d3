use std::net::Ipv4Addr;

use quiver_trace::{Attributes, Trace, Value};

use crate::{Adjuster, AdjusterError};

/// Attribute keys that carry IPv4 addresses, sometimes in packed numeric form.
const IP_ATTRIBUTE_KEYS: [&str; 2] = ["ip", "peer.ipv4"];

/// Rewrites numeric IPv4 attributes into dotted-decimal strings.
///
/// Some instrumentation reports addresses as a big-endian 32-bit integer
/// packed into the low bits of an integer or float attribute. For the keys in
/// [`IP_ATTRIBUTE_KEYS`], on resources and spans alike, such values are
/// replaced with their human-readable form; values of any other type are left
/// untouched.
#[derive(Clone, Copy, Debug, Default)]
pub struct NormalizeIpAttributes;

impl Adjuster for NormalizeIpAttributes {
    fn adjust(&self, trace: &mut Trace) -> Result<(), AdjusterError> {
        for resource_spans in &mut trace.resource_spans {
            normalize(&mut resource_spans.resource.attributes);
            for scope_spans in &mut resource_spans.scope_spans {
                for span in &mut scope_spans.spans {
                    normalize(&mut span.attributes);
                }
            }
        }
        Ok(())
    }
}

fn normalize(attributes: &mut Attributes) {
    for key in IP_ATTRIBUTE_KEYS {
        if let Some(value) = attributes.get_mut(key)
            && let Some(packed) = packed_ipv4(value)
        {
            *value = Value::String(Ipv4Addr::from(packed).to_string());
        }
    }
}

fn packed_ipv4(value: &Value) -> Option<u32> {
    match value {
        Value::I64(value) => Some(*value as u32),
        Value::F64(value) => Some(*value as u32),
        _ => None,
    }
}
