use std::collections::HashMap;
use std::process::{Command, Output};
use tracing::debug;

/// Переменные окружения пользовательской сессии, если мы запущены через sudo
fn build_env_overrides() -> HashMap<String, String> {
    let mut env_vars = HashMap::new();

    if std::env::var("USER").unwrap_or_default() == "root" {
        if let Ok(sudo_user) = std::env::var("SUDO_USER") {
            if let Ok(output) = Command::new("id").args(["-u", &sudo_user]).output() {
                if let Ok(uid_str) = String::from_utf8(output.stdout) {
                    let uid = uid_str.trim();
                    let user_runtime_dir = format!("/run/user/{}", uid);
                    let dbus_address = format!("unix:path={}/bus", user_runtime_dir);

                    debug!(
                        "Подставляем переменные окружения для пользователя {}: uid={}",
                        sudo_user, uid
                    );
                    env_vars.insert("DBUS_SESSION_BUS_ADDRESS".to_string(), dbus_address);
                    env_vars.insert("XDG_RUNTIME_DIR".to_string(), user_runtime_dir);
                    env_vars.insert("USER".to_string(), sudo_user);
                }
            }
        }
    }

    if let Ok(display_var) = std::env::var("DISPLAY") {
        env_vars.insert("DISPLAY".to_string(), display_var);
    }

    env_vars
}

/// Утилита запускается от имени пользователя сессии: под root у неё нет доступа к дисплею
fn session_command(program: &str, args: &[&str]) -> Command {
    let mut cmd = if let Ok(sudo_user) = std::env::var("SUDO_USER") {
        let mut cmd = Command::new("sudo");
        cmd.args(["-E", "-u", &sudo_user, program]);
        cmd.args(args);
        cmd
    } else {
        let mut cmd = Command::new(program);
        cmd.args(args);
        cmd
    };

    for (key, value) in build_env_overrides() {
        cmd.env(key, value);
    }

    cmd
}

/// Запустить утилиту и вернуть stdout; ненулевой код выхода считается ошибкой.
/// Процесс ждётся в пуле блокирующих задач, рабочий поток runtime не занимается.
pub async fn run_tool(program: &str, args: &[&str]) -> crate::error::Result<String> {
    let program = program.to_string();
    let args: Vec<String> = args.iter().map(|arg| arg.to_string()).collect();

    tokio::task::spawn_blocking(move || {
        let args: Vec<&str> = args.iter().map(String::as_str).collect();
        run_tool_blocking(&program, &args)
    })
    .await
    .map_err(|e| crate::keyheat_error!(internal, "Задача запуска утилиты упала: {}", e))?
}

fn run_tool_blocking(program: &str, args: &[&str]) -> crate::error::Result<String> {
    let output: Output = session_command(program, args).output().map_err(|e| {
        crate::keyheat_error!(service_unavailable, "{} не найден: {}", program, e)
    })?;

    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr);
        debug!("{} {:?} вернул ошибку: {}", program, args, stderr.trim());
        return Err(crate::keyheat_error!(
            service_unavailable,
            "{} вернул ошибку: {}",
            program,
            stderr.trim()
        ));
    }

    Ok(String::from_utf8_lossy(&output.stdout).trim().to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::KeyheatError;

    #[tokio::test]
    async fn test_missing_tool_is_unavailable() {
        let result = run_tool("keyheat-missing-tool", &["--version"]).await;
        assert!(matches!(result, Err(KeyheatError::ServiceUnavailable(_))));
    }

    #[tokio::test(flavor = "current_thread")]
    async fn test_tool_runs_off_the_runtime_thread() {
        let ticker = tokio::spawn(async {
            tokio::time::sleep(std::time::Duration::from_millis(10)).await;
            "tick"
        });
        let output = run_tool("sh", &["-c", "sleep 0.2; echo done"]).await;
        assert_eq!(ticker.await.unwrap(), "tick");
        if let Ok(output) = output {
            assert_eq!(output, "done");
        }
    }
}
