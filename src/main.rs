// src/main.rs
use anyhow::{bail, Context, Result};
use booking_page_lib::{
    format_long_date, AppService, BindingTable, DateRange, Document, EventTarget, FieldKind,
    StepTrace,
};
use comfy_table::{presets::UTF8_FULL, Attribute, Cell, Color, ContentArrangement, Table};
use std::io::{self, stdout};
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

mod cli;

fn init_tracing() {
    let env_filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new("warn"))
        .unwrap_or_else(|_| EnvFilter::new("warn"));

    // stdout carries tables and CSV, so logs go to stderr.
    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(io::stderr).with_target(false))
        .with(env_filter)
        .init();
}

fn main() -> Result<()> {
    init_tracing();

    let cli_args = cli::parse_args();
    let export_csv = cli_args.export_csv;

    // Completion generation doesn't need the service or config.
    if let cli::Commands::GenerateCompletion { shell } = cli_args.command {
        let mut cmd = cli::build_cli_command();
        let bin_name = cmd.get_name().to_string();
        clap_complete::generate(shell, &mut cmd, bin_name, &mut stdout());
        return Ok(());
    }

    let service = AppService::initialize().context("Failed to initialize application service")?;
    let header_color = booking_page_lib::parse_color(&service.config.theme.header_color)
        .map(Color::from)
        .unwrap_or(Color::Green);

    match cli_args.command {
        cli::Commands::Bindings { page, today } => {
            let site = service.open_site(page.as_deref(), today)?;
            if site.bindings().is_empty() {
                println!("No behaviour could be attached to this page.");
            } else if export_csv {
                write_bindings_csv(site.document(), site.bindings())?;
            } else {
                print_bindings_table(site.document(), site.bindings(), header_color);
            }
        }
        cli::Commands::Simulate {
            script,
            page,
            today,
            verbose,
        } => {
            let traces = service.simulate(&script, page.as_deref(), today)?;
            if traces.is_empty() {
                println!("Script {} has no steps.", script.display());
            } else if export_csv {
                write_trace_csv(&traces)?;
            } else {
                print_trace_table(&traces, verbose, header_color);
            }
        }
        cli::Commands::Sanitize { kind, text } => {
            let kind = cli_kind_to_field_kind(kind);
            println!("{}", kind.sanitize(&text));
        }
        cli::Commands::CheckPaste { kind, text } => {
            let kind = cli_kind_to_field_kind(kind);
            match kind.validate_paste(&text) {
                Ok(()) => println!("Accepted: {text:?} would be pasted into the {kind} field."),
                Err(e) => {
                    println!("Rejected: {}", service.paste_notice(kind));
                    bail!(e);
                }
            }
        }
        cli::Commands::DateRange { today, check } => {
            let range = service.booking_window(today);
            print_date_range(&range, &service, header_color);
            if let Some(date) = check {
                if range.contains(date) {
                    println!("{date} can be booked.");
                } else {
                    bail!("{date} is outside the bookable range {} to {}", range.min, range.max);
                }
            }
        }
        cli::Commands::ConfigPath => {
            println!("{}", service.get_config_path().display());
        }
        cli::Commands::GenerateCompletion { .. } => {
            // Handled before the service was initialized.
        }
    }

    Ok(())
}

const fn cli_kind_to_field_kind(kind: cli::FieldKindCli) -> FieldKind {
    match kind {
        cli::FieldKindCli::Name => FieldKind::Name,
        cli::FieldKindCli::Phone => FieldKind::Phone,
    }
}

fn describe_target(doc: &Document, target: EventTarget) -> String {
    match target {
        EventTarget::Window => "window".to_string(),
        EventTarget::Node(node) => doc.describe(node),
    }
}

fn header_row(titles: &[&str], color: Color) -> Vec<Cell> {
    titles
        .iter()
        .map(|title| Cell::new(title).fg(color).add_attribute(Attribute::Bold))
        .collect()
}

fn print_bindings_table(doc: &Document, bindings: &BindingTable, header_color: Color) {
    let mut table = Table::new();
    table
        .load_preset(UTF8_FULL)
        .set_content_arrangement(ContentArrangement::Dynamic)
        .set_header(header_row(&["#", "Unit", "Target", "Event", "Handler"], header_color));

    for (i, binding) in bindings.iter().enumerate() {
        table.add_row(vec![
            Cell::new(i + 1),
            Cell::new(binding.handler.unit()),
            Cell::new(describe_target(doc, binding.target)),
            Cell::new(binding.kind),
            Cell::new(binding.handler),
        ]);
    }
    println!("{table}");
}

fn write_bindings_csv(doc: &Document, bindings: &BindingTable) -> Result<()> {
    let mut writer = csv::Writer::from_writer(io::stdout());
    writer.write_record(["Unit", "Target", "Event", "Handler"])?;
    for binding in bindings {
        writer.write_record([
            binding.handler.unit().to_string(),
            describe_target(doc, binding.target),
            binding.kind.to_string(),
            binding.handler.to_string(),
        ])?;
    }
    writer.flush()?;
    Ok(())
}

fn option_cell<T: ToString>(value: Option<T>) -> String {
    value.map_or_else(|| "-".to_string(), |v| v.to_string())
}

fn handlers_run(trace: &StepTrace) -> String {
    let names: Vec<String> = trace
        .dispatched
        .iter()
        .flat_map(|record| record.handlers.iter().map(ToString::to_string))
        .collect();
    if names.is_empty() {
        "-".to_string()
    } else {
        names.join(", ")
    }
}

fn events_fired(trace: &StepTrace) -> String {
    trace
        .dispatched
        .iter()
        .map(|record| {
            if record.default_prevented {
                format!("{} (prevented)", record.event.kind)
            } else {
                record.event.kind.to_string()
            }
        })
        .collect::<Vec<_>>()
        .join(", ")
}

fn print_trace_table(traces: &[StepTrace], verbose: bool, header_color: Color) {
    let mut titles = vec!["#", "Step"];
    if verbose {
        titles.extend(["Events", "Handlers"]);
    }
    titles.extend(["Modal", "Nav", "Date", "Help", "Shadow", "Scroll Y"]);

    let mut table = Table::new();
    table
        .load_preset(UTF8_FULL)
        .set_content_arrangement(ContentArrangement::Dynamic)
        .set_header(header_row(&titles, header_color));

    for trace in traces {
        let snap = &trace.snapshot;
        let mut row = vec![Cell::new(trace.index), Cell::new(&trace.step)];
        if verbose {
            row.push(Cell::new(events_fired(trace)));
            row.push(Cell::new(handlers_run(trace)));
        }
        row.extend([
            Cell::new(snap.modal),
            Cell::new(option_cell(snap.nav)),
            Cell::new(option_cell(snap.date_value.as_deref().filter(|v| !v.is_empty()))),
            Cell::new(snap.help),
            Cell::new(option_cell(snap.header_shadow)),
            Cell::new(format!("{:.0}", snap.scroll_y)),
        ]);
        table.add_row(row);
    }
    println!("{table}");

    if let Some(last) = traces.last() {
        for alert in &last.snapshot.alerts {
            println!("alert: {alert}");
        }
    }
}

fn write_trace_csv(traces: &[StepTrace]) -> Result<()> {
    let mut writer = csv::Writer::from_writer(io::stdout());
    writer.write_record([
        "Step", "Action", "Handlers", "Modal", "Nav", "Glyph", "Date", "Help", "Shadow",
        "ScrollY", "Alerts",
    ])?;
    for trace in traces {
        let snap = &trace.snapshot;
        writer.write_record([
            trace.index.to_string(),
            trace.step.to_string(),
            handlers_run(trace),
            snap.modal.to_string(),
            option_cell(snap.nav),
            option_cell(snap.glyph),
            snap.date_value.clone().unwrap_or_default(),
            snap.help.to_string(),
            option_cell(snap.header_shadow),
            format!("{:.0}", snap.scroll_y),
            snap.alerts.len().to_string(),
        ])?;
    }
    writer.flush()?;
    Ok(())
}

fn print_date_range(range: &DateRange, service: &AppService, header_color: Color) {
    let format = &service.config.date.display_format;
    let mut table = Table::new();
    table
        .load_preset(UTF8_FULL)
        .set_content_arrangement(ContentArrangement::Dynamic)
        .set_header(header_row(&["Bound", "Attribute", "Shown As"], header_color));
    table.add_row(vec![
        Cell::new("min"),
        Cell::new(range.min_attr()),
        Cell::new(format_long_date(range.min, format)),
    ]);
    table.add_row(vec![
        Cell::new("max"),
        Cell::new(range.max_attr()),
        Cell::new(format_long_date(range.max, format)),
    ]);
    println!("{table}");
}
