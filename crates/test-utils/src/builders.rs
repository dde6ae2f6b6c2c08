#![allow(dead_code)]

use lineagehook::config::{ConfigFile, RawConfigFile, WorkflowConfig};
use lineagehook::types::StoreBackend;
use std::path::Path;

/// Builder for `ConfigFile` to simplify test setup.
pub struct ConfigFileBuilder {
    config: RawConfigFile,
}

impl ConfigFileBuilder {
    pub fn new() -> Self {
        Self {
            config: RawConfigFile::default(),
        }
    }

    pub fn with_url(mut self, url: &str) -> Self {
        self.config.lineage.url = Some(url.to_string());
        self
    }

    pub fn with_namespace(mut self, namespace: &str) -> Self {
        self.config.lineage.namespace = Some(namespace.to_string());
        self
    }

    pub fn with_file_store(mut self, root: &Path) -> Self {
        self.config.store.backend = StoreBackend::File;
        self.config.store.path = root.to_path_buf();
        self
    }

    pub fn with_retention(mut self, retention: &str) -> Self {
        self.config.store.retention = retention.to_string();
        self
    }

    pub fn with_write_attempts(mut self, attempts: u32) -> Self {
        self.config.store.write_attempts = attempts;
        self
    }

    pub fn with_timeouts_ms(mut self, lineage_ms: u64, store_ms: u64) -> Self {
        self.config.lineage.timeout_ms = lineage_ms;
        self.config.store.timeout_ms = store_ms;
        self
    }

    pub fn with_workflow(mut self, id: &str, workflow: WorkflowConfig) -> Self {
        self.config.workflow.insert(id.to_string(), workflow);
        self
    }

    /// The unvalidated config, e.g. to run it through the env overlay.
    pub fn raw(self) -> RawConfigFile {
        self.config
    }

    pub fn build(self) -> ConfigFile {
        ConfigFile::try_from(self.config).expect("Failed to build valid config from builder")
    }
}

impl Default for ConfigFileBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// Builder for `WorkflowConfig`.
pub struct WorkflowConfigBuilder {
    workflow: WorkflowConfig,
}

impl WorkflowConfigBuilder {
    pub fn new(schedule: &str) -> Self {
        Self {
            workflow: WorkflowConfig {
                schedule: schedule.to_string(),
                location: None,
                inputs: vec![],
                outputs: vec![],
                description: None,
                timezone: None,
            },
        }
    }

    pub fn location(mut self, location: &str) -> Self {
        self.workflow.location = Some(location.to_string());
        self
    }

    pub fn input(mut self, urn: &str) -> Self {
        self.workflow.inputs.push(urn.to_string());
        self
    }

    pub fn output(mut self, urn: &str) -> Self {
        self.workflow.outputs.push(urn.to_string());
        self
    }

    pub fn description(mut self, description: &str) -> Self {
        self.workflow.description = Some(description.to_string());
        self
    }

    pub fn timezone(mut self, zone: &str) -> Self {
        self.workflow.timezone = Some(zone.to_string());
        self
    }

    pub fn build(self) -> WorkflowConfig {
        self.workflow
    }
}
