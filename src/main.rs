use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::sync::Arc;
use std::time::Duration;
use tokio::signal;
use tracing::{debug, error, info, warn};

mod config;
mod error;
mod events;
mod keymap;
pub mod mappings;
mod report;
mod services;
mod stats;
mod storage;
mod utils;

use config::Config;
use events::KeyCode;
use keymap::Keymap;
use report::ReportOptions;
use services::{create_keyboard_listener, create_mouse_listener, create_window_detector, Recorder};
use stats::Aggregator;
use storage::{SqliteStore, Store};


#[derive(Parser, Debug)]
#[command(name = "keyheat")]
#[command(about = "Статистика нажатий клавиш и мыши по активным окнам")]
struct Args {
    /// Путь к файлу конфигурации
    #[arg(short, long, default_value = "keyheat.toml")]
    config: String,

    /// Режим сухого запуска (синтетические события вместо устройств)
    #[arg(long)]
    dry_run: bool,

    /// Уровень логирования (перекрывает logging.level)
    #[arg(long)]
    log_level: Option<String>,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Собирать статистику до Ctrl+C (по умолчанию)
    Run,
    /// Показать статистику и тепловую карту
    Report {
        /// Только это окно
        #[arg(long)]
        window: Option<String>,
        /// Раскладка из базы (по умолчанию ANSI)
        #[arg(long)]
        keymap: Option<String>,
        /// Сколько окон показать
        #[arg(long, default_value_t = 10)]
        top: usize,
    },
    /// Удалить статистику одного окна или всю.
    /// Запущенный `keyheat run` держит статистику в памяти и перезапишет её на
    /// ближайшей контрольной точке, поэтому его нужно сначала остановить.
    Clear {
        #[arg(long)]
        window: Option<String>,
    },
    /// Управление раскладками
    Keymaps {
        #[command(subcommand)]
        action: KeymapCommand,
    },
}

#[derive(Subcommand, Debug)]
enum KeymapCommand {
    List,
    /// Создать пустую сплит-раскладку
    CreateSplit {
        name: String,
        rows: usize,
        cols: usize,
        thumbs: usize,
    },
    Delete {
        name: String,
    },
    /// Добавить пустой слой с геометрией первого слоя
    AddLayer {
        name: String,
        layer: String,
    },
    RemoveLayer {
        name: String,
        layer: String,
    },
    /// Назначить клавишу ячейке слоя (имя клавиши или код, 0 очищает ячейку)
    SetKey {
        name: String,
        layer: String,
        row: usize,
        col: usize,
        key: String,
    },
}

fn main() -> Result<()> {
    let args = Args::parse();

    // Загрузка конфигурации
    let config = Config::load(&args.config)?;

    let level = args.log_level.as_deref().unwrap_or(&config.logging.level);
    init_tracing(level, &config.logging.filter, &config.logging.format)?;

    info!("Запуск keyheat v{}", env!("CARGO_PKG_VERSION"));
    info!("Конфигурация загружена из: {}", args.config);

    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
        .context("Не удалось создать tokio runtime")?;

    let config = Arc::new(config);
    let result = runtime.block_on(async move {
        match args.command.unwrap_or(Command::Run) {
            Command::Run => run(config, args.dry_run).await,
            Command::Report {
                window,
                keymap,
                top,
            } => show_report(&config, window, keymap, top),
            Command::Clear { window } => clear(&config, window),
            Command::Keymaps { action } => keymaps(&config, action),
        }
    });

    // Чтение evdev блокирующее и видит остановку только со следующим событием
    runtime.shutdown_timeout(Duration::from_secs(1));
    result
}

async fn run(config: Arc<Config>, dry_run: bool) -> Result<()> {
    if dry_run {
        warn!("Режим сухого запуска - устройства ввода не открываются");
    } else {
        // Проверка прав доступа
        utils::permissions::check_permissions()?;
    }

    let store = SqliteStore::open(&config.storage.database_path)?;
    let aggregator = Arc::new(Aggregator::new(config.unattributed_policy()));
    aggregator.restore(store.load()?);
    info!("Окон в статистике: {}", aggregator.window_count());

    let keyboard = create_keyboard_listener(&config, dry_run)?;
    let mouse = create_mouse_listener(&config, dry_run)?;
    let window = create_window_detector(&config, dry_run)?;

    let recorder = Recorder::new(aggregator.clone(), keyboard, mouse, window);
    recorder.start()?;

    let mut running = recorder.running_signal();
    let mut readiness_open = true;
    let mut checkpoints = tokio::time::interval(config.checkpoint_interval());
    // первый тик мгновенный
    checkpoints.tick().await;

    info!("Все сервисы запущены");

    loop {
        tokio::select! {
            result = signal::ctrl_c() => {
                match result {
                    Ok(()) => info!("Получен сигнал завершения (Ctrl+C)"),
                    Err(err) => error!("Ошибка при ожидании сигнала завершения: {}", err),
                }
                break;
            }
            _ = checkpoints.tick() => {
                if !recorder.is_running() {
                    debug!("Контрольная точка без полного набора источников");
                }
                if let Err(e) = aggregator.checkpoint(&store) {
                    error!("Не удалось сохранить статистику: {}", e);
                }
            }
            changed = running.changed(), if readiness_open => {
                if changed.is_err() {
                    // дальше ждём только Ctrl+C и таймер
                    warn!("Сбор событий остановлен: источник завершился");
                    readiness_open = false;
                    continue;
                }
                if *running.borrow_and_update() {
                    info!("Все источники готовы, сбор событий идёт");
                } else {
                    warn!("Один из источников не готов, события могут теряться");
                }
            }
        }
    }

    info!("Завершение работы...");
    recorder.stop();

    let shutdown_timeout = Duration::from_secs(5);
    if recorder.join(shutdown_timeout).await {
        info!("Все сервисы завершили работу корректно");
    }

    let saved = aggregator.checkpoint(&store)?;
    info!(
        "Сохранено {} окон, отброшено событий без окна: {}, не дождались фокуса: {}",
        saved,
        aggregator.dropped_count(),
        aggregator.pending_count()
    );
    if let Some(active) = aggregator.active_window() {
        info!("Последнее активное окно: \"{}\"", active);
    }

    info!("keyheat завершил работу");
    Ok(())
}

fn show_report(
    config: &Config,
    window: Option<String>,
    keymap: Option<String>,
    top: usize,
) -> Result<()> {
    let store = SqliteStore::open(&config.storage.database_path)?;

    let keymap = match keymap {
        Some(name) => store
            .list_keymaps()?
            .into_iter()
            .find(|k| k.name == name)
            .with_context(|| format!("Раскладка \"{}\" не найдена", name))?,
        None => Keymap::ansi(),
    };

    let aggregator = Aggregator::default();
    aggregator.restore(store.load()?);

    let presses = match &window {
        Some(id) => aggregator
            .lookup(id)
            .map(|w| w.key_presses)
            .unwrap_or_default(),
        None => aggregator.total_key_presses(),
    };

    let options = ReportOptions { window, top };
    print!(
        "{}",
        report::render(&aggregator.snapshot(), &presses, &keymap, &options)
    );
    Ok(())
}

fn clear(config: &Config, window: Option<String>) -> Result<()> {
    let store = SqliteStore::open(&config.storage.database_path)?;

    match window {
        Some(id) => {
            let aggregator = Aggregator::default();
            aggregator.restore(store.load()?);
            match aggregator.remove(&id) {
                Some(removed) => {
                    store.delete(&id)?;
                    println!(
                        "Статистика окна \"{}\" удалена ({} нажатий)",
                        id,
                        removed.total_key_presses()
                    );
                }
                None => println!("Окно \"{}\" не найдено", id),
            }
        }
        None => {
            let removed = store.clear()?;
            println!("Удалено окон: {}", removed);
        }
    }
    Ok(())
}

fn keymaps(config: &Config, action: KeymapCommand) -> Result<()> {
    let store = SqliteStore::open(&config.storage.database_path)?;

    match action {
        KeymapCommand::List => {
            let keymaps = store.list_keymaps()?;
            if keymaps.is_empty() {
                println!("Сохранённых раскладок нет (по умолчанию используется ANSI)");
            }
            for keymap in keymaps {
                let layers: Vec<&str> = keymap.layers.iter().map(|l| l.name.as_str()).collect();
                println!("{}: {}", keymap.name, layers.join(", "));
            }
        }
        KeymapCommand::CreateSplit {
            name,
            rows,
            cols,
            thumbs,
        } => {
            let keymap = Keymap::split(name, rows, cols, thumbs)?;
            store.save_keymap(&keymap)?;
            println!("Раскладка \"{}\" сохранена", keymap.name);
        }
        KeymapCommand::Delete { name } => {
            if store.delete_keymap(&name)? {
                println!("Раскладка \"{}\" удалена", name);
            } else {
                println!("Раскладка \"{}\" не найдена", name);
            }
        }
        KeymapCommand::AddLayer { name, layer } => {
            edit_keymap(&store, &name, |keymap| keymap.add_layer(layer.as_str()).map(|_| ()))?;
            println!("Слой \"{}\" добавлен в раскладку \"{}\"", layer, name);
        }
        KeymapCommand::RemoveLayer { name, layer } => {
            edit_keymap(&store, &name, |keymap| {
                if keymap.remove_layer(&layer) {
                    Ok(())
                } else {
                    Err(keyheat_error!(invalid_keymap, "Слой \"{}\" не найден", layer))
                }
            })?;
            println!("Слой \"{}\" удалён из раскладки \"{}\"", layer, name);
        }
        KeymapCommand::SetKey {
            name,
            layer,
            row,
            col,
            key,
        } => {
            let code = KeyCode::parse(&key)
                .with_context(|| format!("Неизвестная клавиша: {}", key))?;
            edit_keymap(&store, &name, |keymap| match keymap.layer_mut(&layer) {
                Some(target) => target.set_key(row, col, code),
                None => Err(keyheat_error!(invalid_keymap, "Слой \"{}\" не найден", layer)),
            })?;
            println!("{}[{}][{}] = {}", layer, row, col, code);
        }
    }
    Ok(())
}

/// Загрузить раскладку, изменить и сохранить обратно
fn edit_keymap<F>(store: &dyn Store, name: &str, edit: F) -> Result<Keymap>
where
    F: FnOnce(&mut Keymap) -> error::Result<()>,
{
    let mut keymap = store
        .list_keymaps()?
        .into_iter()
        .find(|k| k.name == name)
        .with_context(|| format!("Раскладка \"{}\" не найдена", name))?;

    edit(&mut keymap)?;
    keymap.validate()?;
    store.save_keymap(&keymap)?;
    Ok(keymap)
}

fn init_tracing(level: &str, filter: &str, format: &str) -> Result<()> {
    use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

    let directives = if filter.is_empty() {
        level.to_string()
    } else {
        format!("{},{}", level, filter)
    };
    let filter = EnvFilter::try_from_default_env().or_else(|_| EnvFilter::try_new(directives))?;

    let registry = tracing_subscriber::registry().with(filter);
    match format {
        "full" => registry.with(tracing_subscriber::fmt::layer()).init(),
        _ => registry
            .with(tracing_subscriber::fmt::layer().compact())
            .init(),
    }

    Ok(())
}
