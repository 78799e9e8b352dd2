//! # Allocation solutions
//!
//! Read-only view of a previously computed allocation: which container
//! classes run on which VMs and with how many replicas, the performance of
//! each (instance class, container class) pair, and the workload each
//! application was sized for. The summaries in `summary` turn it into
//! tables for display.

pub mod summary;

use crate::data::units::Quantity;
use anyhow::{Context, Result};
use log::{error, info};
use serde::{Deserialize, Serialize};
use std::{fs::File, io::BufReader, path::Path};

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Vm {
    /// Instance class the VM belongs to.
    pub ic: String,
    /// VM name, ending in `-<index>`.
    pub name: String,
}

impl Vm {
    /// Short display name `vmNN` built from the numeric suffix of the VM
    /// name.
    pub fn short_name(&self) -> Result<String> {
        let suffix = self.name.rsplit('-').next().unwrap_or_default();
        let index: u32 = suffix.parse().map_err(|e| {
            let reason = format!("VM name without numeric suffix (name={}, error={e})", self.name);
            error!("{reason}");
            anyhow::anyhow!(reason)
        })?;
        Ok(format!("vm{index:02}"))
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ContainerAllocation {
    pub vm: Vm,
    /// Container class.
    pub cc: String,
    pub replicas: u32,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Allocation {
    pub containers: Vec<ContainerAllocation>,
}

/// Requests per unit of time a single container of class `cc` serves on
/// an instance of class `ic`.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Performance {
    pub ic: String,
    pub cc: String,
    pub value: Quantity,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Workload {
    pub app: String,
    pub num_reqs: f64,
    pub time_slot_size: Quantity,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Solution {
    pub allocation: Allocation,
    #[serde(default)]
    pub performances: Vec<Performance>,
    #[serde(default)]
    pub workloads: Vec<Workload>,
}

pub fn read_solution(path: &Path) -> Result<Solution> {
    let file = File::open(path)
        .with_context(|| format!("error opening solution (path={})", path.display()))?;
    let solution: Solution = serde_json::from_reader(BufReader::new(file))
        .with_context(|| format!("error parsing solution (path={})", path.display()))?;
    info!(
        "read solution with {} container allocations from {}",
        solution.allocation.containers.len(),
        path.display()
    );

    Ok(solution)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_vm_short_name() {
        let vm = Vm {
            ic: "m5.large".to_string(),
            name: "m5.large-7".to_string(),
        };
        assert_eq!(vm.short_name().unwrap(), "vm07");

        let vm = Vm {
            ic: "m5.large".to_string(),
            name: "c5-2xlarge-123".to_string(),
        };
        assert_eq!(vm.short_name().unwrap(), "vm123");
    }

    #[test]
    fn test_vm_short_name_without_index() {
        let vm = Vm {
            ic: "m5.large".to_string(),
            name: "m5.large".to_string(),
        };
        assert!(vm.short_name().is_err());
    }

    #[test]
    fn test_parse_solution() {
        let json = r#"{
            "allocation": {
                "containers": [
                    {"vm": {"ic": "m5.large", "name": "m5.large-0"}, "cc": "cc0app0", "replicas": 2}
                ]
            },
            "workloads": [
                {"app": "app0", "num_reqs": 7200, "time_slot_size": {"magnitude": 1, "unit": "hour"}}
            ]
        }"#;
        let solution: Solution = serde_json::from_str(json).unwrap();

        assert_eq!(solution.allocation.containers[0].replicas, 2);
        assert!(solution.performances.is_empty());
        assert_eq!(solution.workloads[0].time_slot_size.unit, "hour");
    }

    #[test]
    fn test_read_solution_from_file() {
        let path =
            std::env::temp_dir().join(format!("simplot-solution-{}.json", std::process::id()));
        std::fs::write(
            &path,
            r#"{"allocation": {"containers": [
                {"vm": {"ic": "c5.large", "name": "c5.large-3"}, "cc": "cc1app1", "replicas": 1}
            ]}}"#,
        )
        .unwrap();

        let solution = read_solution(&path).unwrap();
        std::fs::remove_file(&path).unwrap();

        assert_eq!(solution.allocation.containers.len(), 1);
        assert_eq!(solution.allocation.containers[0].vm.short_name().unwrap(), "vm03");
        assert!(solution.workloads.is_empty());
    }

    #[test]
    fn test_read_missing_solution_fails() {
        let path = std::env::temp_dir().join("simplot-no-such-solution.json");
        assert!(read_solution(&path).is_err());
    }
}
