use std::path::PathBuf;

use log::info;

use support_timetable::config::AppConfig;
use support_timetable::display::{print_timetable, print_unsupported, write_timetable_to_file};
use support_timetable::parser::{load_attendance, load_staff, load_students};
use support_timetable::roster::{export_staff_to_csv, export_students_to_csv};
use support_timetable::timetable::engine::unsupported_slots;
use support_timetable::timetable::{Heuristic, Semester};
use support_timetable::web::{self, AppState};
use support_timetable::workspace::Workspace;

/// Options of the `assign` command
struct AssignOptions {
    students_csv: PathBuf,
    staff_csv: PathBuf,
    attendance_csv: Option<PathBuf>,
    heuristic: Heuristic,
    semester: Semester,
    out: Option<PathBuf>,
}

impl AssignOptions {
    fn parse(args: &[String], config: &AppConfig) -> Result<AssignOptions, String> {
        let mut positional = Vec::new();
        let mut attendance_csv = None;
        let mut heuristic = Heuristic::Severity;
        let mut semester = Semester::FIRST;
        let mut out = None;

        let mut iter = args.iter();
        while let Some(arg) = iter.next() {
            let mut value = |flag: &str| {
                iter.next()
                    .cloned()
                    .ok_or_else(|| format!("{} needs a value", flag))
            };
            match arg.as_str() {
                "--attendance" => attendance_csv = Some(PathBuf::from(value(arg.as_str())?)),
                "--heuristic" => heuristic = value(arg.as_str())?.parse()?,
                "--semester" => {
                    let raw = value(arg.as_str())?;
                    semester = raw
                        .parse::<u8>()
                        .ok()
                        .and_then(Semester::new)
                        .ok_or_else(|| format!("Invalid semester: {}", raw))?;
                }
                "--out" => out = Some(PathBuf::from(value(arg.as_str())?)),
                other => positional.push(PathBuf::from(other)),
            }
        }

        let mut positional = positional.into_iter();
        Ok(AssignOptions {
            students_csv: positional.next().unwrap_or_else(|| config.data_dir.join("students.csv")),
            staff_csv: positional.next().unwrap_or_else(|| config.data_dir.join("staff.csv")),
            attendance_csv,
            heuristic,
            semester,
            out,
        })
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let config = AppConfig::from_env();
    let args: Vec<String> = std::env::args().collect();

    match args.get(1).map(String::as_str) {
        Some("web") => {
            let port = args
                .get(2)
                .and_then(|p| p.parse::<u16>().ok())
                .unwrap_or(config.port);
            let workspace = Workspace::load(&config.workspace_path)?;

            println!("Starting web server on port {}...", port);
            println!("Workspace file: {}", config.workspace_path.display());
            println!("API available at http://localhost:{}/api", port);

            web::start_server(port, AppState::new(workspace, Some(config.workspace_path.clone()))).await?;
            Ok(())
        }
        Some("export") => {
            let workspace = Workspace::load(&config.workspace_path)?;
            std::fs::create_dir_all(&config.data_dir)?;
            let students_csv = config.data_dir.join("students.csv");
            let staff_csv = config.data_dir.join("staff.csv");
            export_students_to_csv(&workspace.students, &students_csv)?;
            export_staff_to_csv(&workspace.staff, &staff_csv)?;
            println!("Rosters exported to:");
            println!("  - {}", students_csv.display());
            println!("  - {}", staff_csv.display());
            Ok(())
        }
        Some("assign") => run_assign(&args[2..], &config),
        _ => run_assign(args.get(1..).unwrap_or(&[]), &config),
    }
}

fn run_assign(args: &[String], config: &AppConfig) -> Result<(), Box<dyn std::error::Error>> {
    let options = AssignOptions::parse(args, config)?;
    let mut workspace = Workspace::load(&config.workspace_path)?;

    // CSV rosters replace the saved ones when present
    if options.students_csv.exists() {
        workspace.students = load_students(&options.students_csv)?;
        info!("Loaded {} students from {}", workspace.students.len(), options.students_csv.display());
    }
    if options.staff_csv.exists() {
        workspace.staff = load_staff(&options.staff_csv)?;
        info!("Loaded {} staff from {}", workspace.staff.len(), options.staff_csv.display());
    }
    if let Some(path) = &options.attendance_csv {
        workspace.attendance = load_attendance(path)?;
    }

    println!("\n=== Running Auto-Assignment ({:?}) ===", options.heuristic);
    let store = workspace.auto_assign(options.semester, options.heuristic)?.clone();

    print_timetable(options.semester, &store, &workspace.students, &workspace.staff);
    print_unsupported(&unsupported_slots(&store, &workspace.students, &workspace.attendance));

    let out = options
        .out
        .clone()
        .unwrap_or_else(|| PathBuf::from(format!("timetable_semester{}.txt", options.semester)));
    write_timetable_to_file(options.semester, &store, &workspace.students, &workspace.staff, &out)?;
    println!("\nTimetable saved to: {}", out.display());

    workspace.save(&config.workspace_path)?;
    Ok(())
}
