//! Process-status command handler.

use crate::error::Result;
use crate::process::{list_processes, ProcessInfo};
use std::io::Write;

/// List running processes that can be passed to `--process-id` or `--name`.
pub fn process_status_command(out: &mut dyn Write) -> Result<i32> {
    print_processes(out, &list_processes())?;
    Ok(0)
}

fn print_processes(out: &mut dyn Write, processes: &[ProcessInfo]) -> Result<()> {
    let name_width = processes
        .iter()
        .map(|p| p.name.chars().count())
        .max()
        .unwrap_or(0);

    for process in processes {
        writeln!(
            out,
            "{:>10} {:<width$} {}",
            process.pid,
            process.name,
            process.command_line,
            width = name_width
        )?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_print_processes_aligns_columns() {
        let processes = vec![
            ProcessInfo {
                pid: 1,
                name: "init".to_string(),
                command_line: "/sbin/init".to_string(),
            },
            ProcessInfo {
                pid: 31337,
                name: "webapp".to_string(),
                command_line: "dotnet webapp.dll".to_string(),
            },
        ];
        let mut out = Vec::new();
        print_processes(&mut out, &processes).unwrap();

        let text = String::from_utf8(out).unwrap();
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines[0], "         1 init   /sbin/init");
        assert_eq!(lines[1], "     31337 webapp dotnet webapp.dll");
    }

    #[test]
    fn test_process_status_lists_current_process() {
        let mut out = Vec::new();
        assert_eq!(process_status_command(&mut out).unwrap(), 0);

        let me = std::process::id().to_string();
        let text = String::from_utf8(out).unwrap();
        assert!(text.lines().any(|l| l.split_whitespace().next() == Some(me.as_str())));
    }
}
