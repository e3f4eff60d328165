//! Process discovery backed by sysinfo.
//!
//! Used by `process-status` to list candidate processes and by sessions to
//! turn a `--name` into a pid.

use crate::engine::ProcessTarget;
use crate::error::{CountersError, Result};
use sysinfo::{Pid, ProcessRefreshKind, ProcessesToUpdate, System, UpdateKind};

/// A running process as shown by `process-status`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProcessInfo {
    pub pid: u32,
    pub name: String,
    pub command_line: String,
}

/// Snapshot every visible process, ordered by pid.
pub fn list_processes() -> Vec<ProcessInfo> {
    let mut system = System::new();
    system.refresh_processes_specifics(
        ProcessesToUpdate::All,
        true,
        ProcessRefreshKind::nothing().with_cmd(UpdateKind::OnlyIfNotSet),
    );

    let mut processes: Vec<ProcessInfo> = system
        .processes()
        .iter()
        .map(|(pid, process)| ProcessInfo {
            pid: pid.as_u32(),
            name: process.name().to_string_lossy().into_owned(),
            command_line: process
                .cmd()
                .iter()
                .map(|arg| arg.to_string_lossy())
                .collect::<Vec<_>>()
                .join(" "),
        })
        .collect();

    processes.sort_by_key(|p| p.pid);
    processes
}

/// Find the single process called `name`.
///
/// Names compare case-insensitively. More than one match is an error since
/// attaching to an arbitrary one would be surprising.
pub fn find_by_name(processes: &[ProcessInfo], name: &str) -> Result<u32> {
    let matches: Vec<u32> = processes
        .iter()
        .filter(|p| p.name.eq_ignore_ascii_case(name))
        .map(|p| p.pid)
        .collect();

    match matches.as_slice() {
        [] => Err(CountersError::ProcessNameNotFound(name.to_string())),
        [pid] => Ok(*pid),
        pids => Err(CountersError::AmbiguousProcessName(
            name.to_string(),
            pids.iter()
                .map(u32::to_string)
                .collect::<Vec<_>>()
                .join(", "),
        )),
    }
}

/// Resolve a target to a live pid and its process name.
pub fn resolve_target(target: &ProcessTarget) -> Result<(u32, String)> {
    match target {
        ProcessTarget::Pid(pid) => {
            let mut system = System::new();
            let sys_pid = Pid::from_u32(*pid);
            system.refresh_processes_specifics(
                ProcessesToUpdate::Some(&[sys_pid]),
                true,
                ProcessRefreshKind::nothing(),
            );
            let process = system
                .process(sys_pid)
                .ok_or(CountersError::ProcessNotFound(*pid))?;
            Ok((*pid, process.name().to_string_lossy().into_owned()))
        }
        ProcessTarget::Name(name) => {
            let pid = find_by_name(&list_processes(), name)?;
            Ok((pid, name.clone()))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn info(pid: u32, name: &str) -> ProcessInfo {
        ProcessInfo {
            pid,
            name: name.to_string(),
            command_line: String::new(),
        }
    }

    #[test]
    fn test_find_by_name_matches_case_insensitively() {
        let processes = vec![info(1, "init"), info(42, "WebApp")];
        assert_eq!(find_by_name(&processes, "webapp").unwrap(), 42);
    }

    #[test]
    fn test_find_by_name_missing() {
        let err = find_by_name(&[info(1, "init")], "webapp").unwrap_err();
        assert!(matches!(err, CountersError::ProcessNameNotFound(ref n) if n == "webapp"));
    }

    #[test]
    fn test_find_by_name_ambiguous_lists_pids() {
        let processes = vec![info(7, "worker"), info(9, "worker")];
        let err = find_by_name(&processes, "worker").unwrap_err();
        assert!(err.to_string().contains("7, 9"));
    }

    #[test]
    fn test_list_processes_includes_self() {
        let me = std::process::id();
        assert!(list_processes().iter().any(|p| p.pid == me));
    }

    #[test]
    fn test_resolve_target_by_pid_finds_self() {
        let me = std::process::id();
        let (pid, name) = resolve_target(&ProcessTarget::Pid(me)).unwrap();
        assert_eq!(pid, me);
        assert!(!name.is_empty());
    }

    #[test]
    fn test_resolve_target_unknown_pid() {
        let err = resolve_target(&ProcessTarget::Pid(u32::MAX - 1)).unwrap_err();
        assert!(matches!(err, CountersError::ProcessNotFound(_)));
    }
}
