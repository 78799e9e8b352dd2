use crate::{
    allocation::{Allocation, Performance, Workload},
    data::units::UnitContext,
    table::Table,
};
use anyhow::Result;
use log::error;
use std::collections::{BTreeMap, BTreeSet};

#[derive(Clone, Debug, PartialEq)]
pub struct AllocationRow {
    pub instance_class: String,
    pub vm_name: String,
    pub container_class: String,
    pub replicas: u32,
}

/// One row per allocated container, skipping containers with no replicas.
pub fn allocation_rows(allocation: &Allocation) -> Result<Vec<AllocationRow>> {
    allocation
        .containers
        .iter()
        .filter(|c| c.replicas > 0)
        .map(|c| {
            Ok(AllocationRow {
                instance_class: c.vm.ic.clone(),
                vm_name: c.vm.short_name()?,
                container_class: c.cc.clone(),
                replicas: c.replicas,
            })
        })
        .collect()
}

pub fn allocation_table(rows: &[AllocationRow]) -> Table {
    let mut table = Table::new(
        "Allocation",
        &["Instance Class", "VM name", "Container Class", "# repl"],
    );
    for row in rows {
        table.push_row(vec![
            row.instance_class.clone(),
            row.vm_name.clone(),
            row.container_class.clone(),
            row.replicas.to_string(),
        ]);
    }
    table
}

#[derive(Clone, Debug, PartialEq)]
pub struct VmCount {
    pub instance_class: String,
    pub vm_count: usize,
}

/// Number of distinct VMs used of each instance class, sorted by class.
pub fn allocated_vms(rows: &[AllocationRow]) -> Vec<VmCount> {
    let mut vms = BTreeMap::<&str, BTreeSet<&str>>::new();
    for row in rows {
        vms.entry(row.instance_class.as_str())
            .or_default()
            .insert(row.vm_name.as_str());
    }

    vms.into_iter()
        .map(|(ic, names)| VmCount {
            instance_class: ic.to_string(),
            vm_count: names.len(),
        })
        .collect()
}

pub fn allocated_vms_table(counts: &[VmCount]) -> Table {
    let mut table = Table::new("Allocated VMs", &["Instance Class", "VM count"]);
    for count in counts {
        table.push_row(vec![count.instance_class.clone(), count.vm_count.to_string()]);
    }
    table
}

#[derive(Clone, Debug, PartialEq)]
pub struct ContainerReplicas {
    pub app: String,
    pub container_class: String,
    pub instance_class: String,
    pub replicas: u32,
}

/// Container class names end with the application they serve, e.g.
/// `cc2app0`.
fn app_of_container_class(cc: &str) -> String {
    let chars: Vec<char> = cc.chars().collect();
    chars[chars.len().saturating_sub(4)..].iter().collect()
}

/// Replicas per (container class, instance class), ordered by the last
/// character of the container class (the application index).
pub fn allocated_ccs(rows: &[AllocationRow]) -> Vec<ContainerReplicas> {
    let mut replicas = BTreeMap::<(&str, &str), u32>::new();
    for row in rows {
        *replicas
            .entry((row.container_class.as_str(), row.instance_class.as_str()))
            .or_default() += row.replicas;
    }

    let mut ccs: Vec<ContainerReplicas> = replicas
        .into_iter()
        .map(|((cc, ic), replicas)| ContainerReplicas {
            app: app_of_container_class(cc),
            container_class: cc.to_string(),
            instance_class: ic.to_string(),
            replicas,
        })
        .collect();
    ccs.sort_by_key(|c| c.container_class.chars().last());

    ccs
}

pub fn allocated_ccs_table(ccs: &[ContainerReplicas]) -> Table {
    let mut table = Table::new(
        "Allocated container classes",
        &["app", "Container Class", "Instance Class", "# replicas"],
    );
    for cc in ccs {
        table.push_row(vec![
            cc.app.clone(),
            cc.container_class.clone(),
            cc.instance_class.clone(),
            cc.replicas.to_string(),
        ]);
    }
    table
}

#[derive(Clone, Debug, PartialEq)]
pub struct WorkloadSummary {
    pub application: String,
    pub total_requests: f64,
    pub rps: f64,
}

pub fn workload_summary(workloads: &[Workload], units: &UnitContext) -> Result<Vec<WorkloadSummary>> {
    workloads
        .iter()
        .map(|wl| {
            let slot_secs = units.to_seconds(&wl.time_slot_size)?;
            if slot_secs <= 0.0 {
                error!("empty time slot (app={}, slot={})", wl.app, wl.time_slot_size);
                anyhow::bail!("empty time slot (app={})", wl.app);
            }
            Ok(WorkloadSummary {
                application: wl.app.clone(),
                total_requests: wl.num_reqs,
                rps: wl.num_reqs / slot_secs,
            })
        })
        .collect()
}

pub fn workload_summary_table(summary: &[WorkloadSummary]) -> Table {
    let mut table = Table::new("Workloads", &["Application", "Total requests", "rps"]);
    for wl in summary {
        table.push_row(vec![
            wl.application.clone(),
            wl.total_requests.to_string(),
            format!("{:.3}", wl.rps),
        ]);
    }
    table
}

/// Requests per second of each (instance class, container class) pair.
/// Rows and columns are sorted; pairs without a figure are `None`.
#[derive(Clone, Debug, PartialEq)]
pub struct PerformanceMatrix {
    pub instance_classes: Vec<String>,
    pub container_classes: Vec<String>,
    pub values: Vec<Vec<Option<f64>>>,
}

impl PerformanceMatrix {
    pub fn get(&self, ic: &str, cc: &str) -> Option<f64> {
        let row = self.instance_classes.iter().position(|i| i == ic)?;
        let col = self.container_classes.iter().position(|c| c == cc)?;
        self.values[row][col]
    }

    pub fn to_table(&self) -> Table {
        let mut header = vec!["Instance Class"];
        header.extend(self.container_classes.iter().map(String::as_str));
        let mut table = Table::new("Performance (rps)", &header);

        for (ic, values) in self.instance_classes.iter().zip(&self.values) {
            let mut row = vec![ic.clone()];
            row.extend(values.iter().map(|v| match v {
                Some(v) => format!("{v:.3}"),
                None => "-".to_string(),
            }));
            table.push_row(row);
        }
        table
    }
}

pub fn performance_matrix(perfs: &[Performance], units: &UnitContext) -> Result<PerformanceMatrix> {
    let mut cells = BTreeMap::<(&str, &str), f64>::new();
    for perf in perfs {
        let rps = units.to_requests_per_second(&perf.value)?;
        if cells.insert((perf.ic.as_str(), perf.cc.as_str()), rps).is_some() {
            error!("duplicated performance (ic={}, cc={})", perf.ic, perf.cc);
            anyhow::bail!("duplicated performance (ic={}, cc={})", perf.ic, perf.cc);
        }
    }

    let instance_classes: Vec<String> = cells
        .keys()
        .map(|(ic, _)| ic.to_string())
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect();
    let container_classes: Vec<String> = cells
        .keys()
        .map(|(_, cc)| cc.to_string())
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect();

    let values = instance_classes
        .iter()
        .map(|ic| {
            container_classes
                .iter()
                .map(|cc| cells.get(&(ic.as_str(), cc.as_str())).copied())
                .collect()
        })
        .collect();

    Ok(PerformanceMatrix {
        instance_classes,
        container_classes,
        values,
    })
}
