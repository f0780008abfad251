use std::fs;
use std::path::{Path, PathBuf};
use clap::{Arg, ArgAction, Command};
use log::{debug, LevelFilter};
use walkdir::WalkDir;

use beatmap_filter::{
    load_settings, FilterSession, HostMarkup, ItemOutcome, PlaylistAccumulator, PlaylistBuilder,
    Result as ToolsResult, SettingsStore,
};
use utils_common::{format_seconds, FilterSettings};

mod html;

use html::{HtmlNode, Offline};

/// 只读的设置来源：从 JSON 文件读取，离线扫描不回写
struct SettingsFile {
    contents: Option<String>,
}

impl SettingsStore for SettingsFile {
    fn load(&self, _key: &str) -> Option<String> {
        self.contents.clone()
    }

    fn save(&mut self, _key: &str, _value: &str) -> ToolsResult<()> {
        Ok(())
    }
}

// 主函数
fn main() {
    // 设置命令行参数
    let matches = Command::new("谱面筛选扫描器")
        .version(env!("CARGO_PKG_VERSION"))
        .about("对保存下来的 Beatsaver 搜索页面执行筛选并生成歌单")
        .arg(Arg::new("source")
            .short('s')
            .long("source")
            .value_name("SOURCE")
            .help("HTML 文件或目录路径")
            .required(true))
        .arg(Arg::new("settings")
            .short('c')
            .long("settings")
            .value_name("SETTINGS_JSON")
            .help("筛选设置 JSON 文件，缺省时使用默认设置"))
        .arg(Arg::new("playlist")
            .short('p')
            .long("playlist")
            .value_name("OUTPUT_FILE")
            .help("歌单输出路径，指定后开启歌单模式"))
        .arg(Arg::new("name")
            .short('n')
            .long("name")
            .value_name("NAME")
            .help("歌单名称"))
        .arg(Arg::new("failed")
            .short('f')
            .long("failed-only")
            .help("只列出未通过的条目")
            .action(ArgAction::SetTrue))
        .arg(Arg::new("verbose")
            .short('v')
            .long("verbose")
            .help("显示详细信息")
            .action(ArgAction::SetTrue))
        .get_matches();

    let source = matches.get_one::<String>("source").map(PathBuf::from).unwrap_or_default();
    let settings_path = matches.get_one::<String>("settings");
    let playlist_path = matches.get_one::<String>("playlist");
    let name = matches.get_one::<String>("name");
    let failed_only = matches.get_flag("failed");
    let verbose = matches.get_flag("verbose");

    env_logger::Builder::new()
        .filter_level(if verbose { LevelFilter::Debug } else { LevelFilter::Warn })
        .parse_default_env()
        .init();

    if !source.exists() {
        eprintln!("错误: 源路径不存在 '{}'", source.display());
        std::process::exit(1);
    }

    let settings = match read_settings(settings_path.map(String::as_str), playlist_path.is_some(), name) {
        Ok(settings) => settings,
        Err(e) => {
            eprintln!("错误: {}", e);
            std::process::exit(1);
        }
    };

    println!("开始扫描...");
    println!("源路径: {}", source.display());

    match scan(&source, &settings, failed_only) {
        Ok(playlist) => {
            if let Some(path) = playlist_path {
                if let Err(e) = write_playlist(&playlist, &settings, path) {
                    eprintln!("错误: 歌单生成失败: {}", e);
                    std::process::exit(1);
                }
            }
            println!("扫描完成！");
        }
        Err(e) => {
            eprintln!("错误: 扫描失败: {}", e);
            std::process::exit(1);
        }
    }
}

// 读取设置文件并应用命令行覆盖
fn read_settings(path: Option<&str>, make_playlist: bool, name: Option<&String>) -> Result<FilterSettings, String> {
    let contents = match path {
        Some(path) => Some(
            fs::read_to_string(path).map_err(|e| format!("无法读取设置文件 '{}': {}", path, e))?,
        ),
        None => None,
    };

    let mut settings = load_settings(&SettingsFile { contents });
    if make_playlist {
        settings.make_playlist = true;
    }
    if let Some(name) = name {
        settings.playlist_name = name.clone();
    }
    settings.validate()?;
    Ok(settings)
}

// 收集源路径下的全部 HTML 文件
fn collect_pages(source: &Path) -> Vec<PathBuf> {
    if source.is_file() {
        return vec![source.to_path_buf()];
    }

    WalkDir::new(source)
        .sort_by_file_name()
        .into_iter()
        .filter_map(|e| e.ok())
        .filter(|e| {
            e.file_type().is_file()
                && e.path()
                    .extension()
                    .map_or(false, |ext| ext.eq_ignore_ascii_case("html") || ext.eq_ignore_ascii_case("htm"))
        })
        .map(|e| e.into_path())
        .collect()
}

/// 扫描全部页面，返回累积的歌单
fn scan(source: &Path, settings: &FilterSettings, failed_only: bool) -> Result<PlaylistAccumulator, String> {
    let pages = collect_pages(source);
    if pages.is_empty() {
        return Err(format!("'{}' 下没有找到 HTML 文件", source.display()));
    }

    let mut playlist = PlaylistAccumulator::new();
    let mut total = 0;
    let mut passed = 0;

    for page in &pages {
        println!("处理文件: {}", page.display());
        let outcomes = match scan_page(page, settings, &mut playlist) {
            Ok(outcomes) => outcomes,
            Err(e) => {
                eprintln!("警告: 跳过文件 {}: {}", page.display(), e);
                continue;
            }
        };

        for outcome in &outcomes {
            if !(failed_only && outcome.passed()) {
                println!("  {}", describe_outcome(outcome));
            }
        }
        total += outcomes.len();
        passed += outcomes.iter().filter(|o| o.passed()).count();
    }

    println!("文件数量: {}，条目数量: {}，通过: {}", pages.len(), total, passed);
    Ok(playlist)
}

// 单个页面执行一次全量筛选
fn scan_page(path: &Path, settings: &FilterSettings, playlist: &mut PlaylistAccumulator) -> Result<Vec<ItemOutcome>, String> {
    let dom = html::parse_file(path)?;
    let root = HtmlNode::document_element(&dom).ok_or_else(|| "文档没有根元素".to_string())?;

    let mut session = FilterSession::new(
        root,
        Offline,
        Box::new(SettingsFile { contents: None }),
        HostMarkup::default(),
    );
    let outcomes = session.submit(settings.clone()).map_err(|e| e.to_string())?;
    session.stop();

    for hash in session.playlist().snapshot() {
        playlist.record(&hash);
    }
    debug!("{} 的统计: {:?}", path.display(), session.stats());
    Ok(outcomes)
}

fn describe_outcome(outcome: &ItemOutcome) -> String {
    let item = &outcome.item;
    let label = item.id.as_deref().or(item.hash.as_deref()).unwrap_or("?");
    let verdict = match outcome.failed {
        None => "通过".to_string(),
        Some(clause) => format!("未通过 ({})", clause.describe()),
    };
    format!(
        "[{}] {} 作者: {} 赞: {} 踩: {} 下载: {} 评分: {}% 时长: {}",
        label,
        verdict,
        item.author,
        item.upvotes,
        item.downvotes,
        item.downloads,
        item.rating,
        format_seconds(item.duration)
    )
}

// 写出歌单文件
fn write_playlist(playlist: &PlaylistAccumulator, settings: &FilterSettings, path: &str) -> ToolsResult<()> {
    if playlist.is_empty() {
        println!("没有通过筛选的谱面，不生成歌单");
        return Ok(());
    }

    let mut builder = PlaylistBuilder::new().title(settings.playlist_title());
    for hash in playlist.snapshot() {
        builder.add_song(hash);
    }
    builder.save_playlist(path)?;
    println!("歌单已生成: {}，歌曲数量: {}", path, playlist.len());
    Ok(())
}
