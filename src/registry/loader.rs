//! Descriptor file loader
//!
//! Descriptor files live at `<data_dir>/descriptors/*.json`, one aspect per
//! file, and are read once at boot in lexicographic filename order. Any
//! malformed file is FATAL: the process refuses to start rather than run
//! with a partial registry.
//!
//! File shape mirrors the annotation blocks of the source declarations:
//!
//! ```json
//! {
//!   "aspect": { "name": "datasetUsageStatistics", "type": "timeseries" },
//!   "fields": [
//!     { "name": "timestampMillis", "type": "long" },
//!     { "name": "uniqueUserCount", "type": "int", "optional": true,
//!       "timeseriesField": {} },
//!     { "name": "userCounts", "type": { "array": "record" },
//!       "optional": true, "timeseriesFieldCollection": { "key": "user" } }
//!   ]
//! }
//! ```
//!
//! The aspect `"type"` defaults to `"versioned"` when absent.

use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use super::errors::{RegistryError, RegistryResult};
use super::registry::AspectRegistry;
use super::types::{
    AspectDescriptor, AspectKind, FieldDescriptor, SearchHint, TimeseriesHint, ValueType,
};

/// On-disk descriptor file shape.
#[derive(Debug, Serialize, Deserialize)]
struct DescriptorFile {
    aspect: AspectBlock,
    fields: Vec<FieldBlock>,
}

#[derive(Debug, Serialize, Deserialize)]
struct AspectBlock {
    name: String,
    #[serde(
        rename = "type",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    kind: Option<AspectKind>,
}

#[derive(Debug, Serialize, Deserialize)]
struct FieldBlock {
    name: String,
    #[serde(rename = "type")]
    value_type: ValueType,
    #[serde(default, skip_serializing_if = "is_false")]
    optional: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    searchable: Option<SearchHint>,
    #[serde(
        rename = "timeseriesField",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    timeseries_field: Option<TimeseriesFieldBlock>,
    #[serde(
        rename = "timeseriesFieldCollection",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    timeseries_collection: Option<TimeseriesCollectionBlock>,
}

/// Marker annotation; carries no configuration.
#[derive(Debug, Serialize, Deserialize)]
struct TimeseriesFieldBlock {}

#[derive(Debug, Serialize, Deserialize)]
struct TimeseriesCollectionBlock {
    key: String,
}

fn is_false(flag: &bool) -> bool {
    !*flag
}

impl DescriptorFile {
    fn resolve(self, path: &str) -> RegistryResult<AspectDescriptor> {
        let kind = self.aspect.kind.unwrap_or(AspectKind::Versioned);

        let mut fields = Vec::with_capacity(self.fields.len());
        for block in self.fields {
            fields.push(block.resolve(path)?);
        }

        Ok(AspectDescriptor {
            name: self.aspect.name,
            kind,
            fields,
        })
    }

    fn from_descriptor(descriptor: &AspectDescriptor) -> Self {
        let fields = descriptor
            .fields
            .iter()
            .map(|field| {
                let (timeseries_field, timeseries_collection) = match &field.timeseries {
                    Some(hint) if hint.is_collection => (
                        None,
                        Some(TimeseriesCollectionBlock {
                            key: hint.collection_key.clone().unwrap_or_default(),
                        }),
                    ),
                    Some(_) => (Some(TimeseriesFieldBlock {}), None),
                    None => (None, None),
                };
                FieldBlock {
                    name: field.name.clone(),
                    value_type: field.value_type.clone(),
                    optional: field.optional,
                    searchable: field.search.clone(),
                    timeseries_field,
                    timeseries_collection,
                }
            })
            .collect();

        Self {
            aspect: AspectBlock {
                name: descriptor.name.clone(),
                kind: Some(descriptor.kind),
            },
            fields,
        }
    }
}

impl FieldBlock {
    fn resolve(self, path: &str) -> RegistryResult<FieldDescriptor> {
        if self.timeseries_field.is_some() && self.timeseries_collection.is_some() {
            return Err(RegistryError::malformed_descriptor(
                path,
                format!(
                    "field '{}' carries both timeseriesField and timeseriesFieldCollection",
                    self.name
                ),
            ));
        }

        let timeseries = if let Some(block) = self.timeseries_collection {
            Some(TimeseriesHint::collection(block.key))
        } else if self.timeseries_field.is_some() {
            Some(TimeseriesHint::field())
        } else {
            None
        };

        Ok(FieldDescriptor {
            name: self.name,
            value_type: self.value_type,
            optional: self.optional,
            search: self.searchable,
            timeseries,
        })
    }
}

/// Reads descriptor files from disk into a registry.
pub struct DescriptorLoader {
    /// Directory containing descriptor files.
    descriptor_dir: PathBuf,
}

impl DescriptorLoader {
    /// Creates a loader for the given data directory.
    ///
    /// Descriptor files are expected at `<data_dir>/descriptors/`.
    pub fn new(data_dir: &Path) -> Self {
        Self {
            descriptor_dir: data_dir.join("descriptors"),
        }
    }

    /// Returns the descriptor directory path.
    pub fn descriptor_dir(&self) -> &Path {
        &self.descriptor_dir
    }

    /// Loads every `*.json` descriptor file into the registry.
    ///
    /// Files are processed in lexicographic filename order. Returns the
    /// number of descriptors loaded. Any failure is FATAL
    /// (`ADB_MALFORMED_DESCRIPTOR`), including duplicate aspect names
    /// across files.
    pub fn load_into(&self, registry: &mut AspectRegistry) -> RegistryResult<usize> {
        if !self.descriptor_dir.exists() {
            fs::create_dir_all(&self.descriptor_dir).map_err(|e| {
                RegistryError::malformed_descriptor(
                    self.descriptor_dir.display().to_string(),
                    format!("Failed to create descriptor directory: {}", e),
                )
            })?;
            return Ok(0);
        }

        let entries = fs::read_dir(&self.descriptor_dir).map_err(|e| {
            RegistryError::malformed_descriptor(
                self.descriptor_dir.display().to_string(),
                format!("Failed to read descriptor directory: {}", e),
            )
        })?;

        let mut paths = Vec::new();
        for entry in entries {
            let entry = entry.map_err(|e| {
                RegistryError::malformed_descriptor(
                    self.descriptor_dir.display().to_string(),
                    format!("Failed to read directory entry: {}", e),
                )
            })?;

            let path = entry.path();
            if path.extension().map_or(true, |ext| ext != "json") {
                continue;
            }
            paths.push(path);
        }
        paths.sort();

        let mut loaded = 0;
        for path in paths {
            self.load_descriptor_file(&path, registry)?;
            loaded += 1;
        }

        Ok(loaded)
    }

    /// Loads a single descriptor file into the registry.
    fn load_descriptor_file(
        &self,
        path: &Path,
        registry: &mut AspectRegistry,
    ) -> RegistryResult<()> {
        let display = path.display().to_string();

        let content = fs::read_to_string(path).map_err(|e| {
            RegistryError::malformed_descriptor(&display, format!("Failed to read file: {}", e))
        })?;

        let file: DescriptorFile = serde_json::from_str(&content).map_err(|e| {
            RegistryError::malformed_descriptor(&display, format!("Invalid JSON: {}", e))
        })?;

        let descriptor = file.resolve(&display)?;

        // Structure violations and duplicates both halt boot with the
        // offending path attached.
        registry
            .register(descriptor)
            .map_err(|e| RegistryError::malformed_descriptor(&display, e.message()))?;

        Ok(())
    }

    /// Writes a descriptor to its standard file location.
    ///
    /// Refuses to overwrite an existing file.
    pub fn save_descriptor(&self, descriptor: &AspectDescriptor) -> RegistryResult<PathBuf> {
        let path = self
            .descriptor_dir
            .join(format!("{}.json", descriptor.name));
        let display = path.display().to_string();

        if path.exists() {
            return Err(RegistryError::malformed_descriptor(
                &display,
                "Descriptor file already exists",
            ));
        }

        if !self.descriptor_dir.exists() {
            fs::create_dir_all(&self.descriptor_dir).map_err(|e| {
                RegistryError::malformed_descriptor(
                    self.descriptor_dir.display().to_string(),
                    format!("Failed to create descriptor directory: {}", e),
                )
            })?;
        }

        let file = DescriptorFile::from_descriptor(descriptor);
        let content = serde_json::to_string_pretty(&file).map_err(|e| {
            RegistryError::malformed_descriptor(
                &display,
                format!("Failed to serialize descriptor: {}", e),
            )
        })?;

        fs::write(&path, content).map_err(|e| {
            RegistryError::malformed_descriptor(&display, format!("Failed to write file: {}", e))
        })?;

        Ok(path)
    }
}
