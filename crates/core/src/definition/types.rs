use serde::{Deserialize, Serialize};

/// One stage instance inside a pipeline definition.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StageDef {
    pub instance_name: String,
    pub stage_type: String,
}

/// A stored pipeline definition, identified by name and revision.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PipelineDefinition {
    pub name: String,
    pub rev: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub stages: Vec<StageDef>,
}

impl PipelineDefinition {
    pub fn new(name: impl Into<String>, rev: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            rev: rev.into(),
            description: String::new(),
            stages: Vec::new(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_definition_deserializes_with_defaults() {
        let def: PipelineDefinition =
            serde_json::from_str(r#"{"name":"logs","rev":"0"}"#).unwrap();
        assert_eq!(def.name, "logs");
        assert_eq!(def.rev, "0");
        assert!(def.description.is_empty());
        assert!(def.stages.is_empty());
    }

    #[test]
    fn test_definition_round_trips_stages() {
        let mut def = PipelineDefinition::new("logs", "0");
        def.stages.push(StageDef {
            instance_name: "source_1".to_string(),
            stage_type: "dir-spooler".to_string(),
        });

        let json = serde_json::to_string(&def).unwrap();
        let back: PipelineDefinition = serde_json::from_str(&json).unwrap();
        assert_eq!(back, def);
    }
}
