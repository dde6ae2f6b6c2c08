// src/store/key.rs

use std::fmt;

/// Prefix shared by every composite key, so run-id mappings can live in a
/// store that also holds other data.
pub const KEY_PREFIX: &str = "run-id-map";

/// Identifies one run-identity mapping: a host run of a workflow, within a
/// lineage namespace.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct RunKey {
    namespace: String,
    workflow_id: String,
    run_id: String,
}

impl RunKey {
    pub fn new(
        namespace: impl Into<String>,
        workflow_id: impl Into<String>,
        run_id: impl Into<String>,
    ) -> Self {
        Self {
            namespace: namespace.into(),
            workflow_id: workflow_id.into(),
            run_id: run_id.into(),
        }
    }

    pub fn namespace(&self) -> &str {
        &self.namespace
    }

    pub fn workflow_id(&self) -> &str {
        &self.workflow_id
    }

    pub fn run_id(&self) -> &str {
        &self.run_id
    }

    /// Flat string form used by the backends.
    ///
    /// Every component is length-prefixed
    /// (`run-id-map/7:default/5:etl/a/3:r:1`), so ids containing `/` or `:`
    /// can never make two different keys collide.
    pub fn storage_key(&self) -> String {
        let mut out = String::from(KEY_PREFIX);
        for part in [&self.namespace, &self.workflow_id, &self.run_id] {
            out.push('/');
            out.push_str(&part.len().to_string());
            out.push(':');
            out.push_str(part);
        }
        out
    }

    /// Inverse of [`RunKey::storage_key`]; `None` for anything it could not
    /// have produced.
    pub fn from_storage_key(s: &str) -> Option<Self> {
        let mut rest = s.strip_prefix(KEY_PREFIX)?;
        let mut parts = Vec::with_capacity(3);

        while !rest.is_empty() {
            rest = rest.strip_prefix('/')?;
            let (len, tail) = rest.split_once(':')?;
            if len.is_empty() || !len.bytes().all(|b| b.is_ascii_digit()) {
                return None;
            }
            let len: usize = len.parse().ok()?;
            let part = tail.get(..len)?;
            parts.push(part.to_string());
            rest = &tail[len..];
        }

        match <[String; 3]>::try_from(parts) {
            Ok([namespace, workflow_id, run_id]) => Some(Self {
                namespace,
                workflow_id,
                run_id,
            }),
            Err(_) => None,
        }
    }
}

impl fmt::Display for RunKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}#{}", self.namespace, self.workflow_id, self.run_id)
    }
}
