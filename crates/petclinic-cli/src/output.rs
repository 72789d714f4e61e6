//! Terminal rendering of rows, charts and summaries.

use petclinic_core::{DashboardSummary, PetDetail, PickerOption, RecordRow, WeightChart};
use serde::Serialize;

pub fn print_json<T: Serialize + ?Sized>(value: &T) -> anyhow::Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

pub fn print_rows(rows: &[RecordRow]) {
    if rows.is_empty() {
        println!("No records found.");
        return;
    }
    for row in rows {
        println!("[{}] {}", row.id, row.title);
        for line in &row.lines {
            println!("    {line}");
        }
    }
}

pub fn print_options(options: &[PickerOption]) {
    for option in options {
        if option.hint.is_empty() {
            println!("{}", option.value);
        } else {
            println!("{}  ({})", option.value, option.hint);
        }
    }
}

pub fn print_chart(chart: &WeightChart) {
    if chart.is_empty() {
        println!("No weight data.");
        return;
    }
    let label_width = chart
        .series
        .iter()
        .map(|s| s.label.len())
        .max()
        .unwrap_or(0)
        .max(4);

    print!("{:label_width$}", "date");
    for series in &chart.series {
        print!("  {:>10}", truncate(&series.label, 10));
    }
    println!();

    for (i, date) in chart.axis.iter().enumerate() {
        print!("{date:label_width$}");
        for series in &chart.series {
            match series.values.get(i).copied().flatten() {
                Some(w) => print!("  {w:>10}"),
                None => print!("  {:>10}", "-"),
            }
        }
        println!();
    }

    for series in &chart.series {
        println!("{} {} ({})", series.color, series.label, series.pet_id);
    }
}

fn truncate(s: &str, max: usize) -> String {
    s.chars().take(max).collect()
}

pub fn print_dashboard(summary: &DashboardSummary) {
    println!("Pets:                  {}", summary.pet_count);
    println!("Upcoming appointments: {}", summary.upcoming_appointments);
    println!("Vaccines due (30d):    {}", summary.vaccines_due_soon);
    if !summary.species.is_empty() {
        println!("By type:");
        for (species, count) in &summary.species {
            println!("    {species}: {count}");
        }
    }
}

pub fn print_detail(detail: &PetDetail) {
    let pet = &detail.pet;
    println!("{} [{}]", pet.name, pet.id);
    println!("Type: {}", pet.species);
    println!("Age: {}", pet.age_label());
    println!("Owner ID: {}", pet.owner_id.as_deref().unwrap_or("-"));
    println!("Photo: {}", pet.photo_or_default());
    for (title, lines) in detail.sections() {
        println!();
        println!("{title}");
        if lines.is_empty() {
            println!("    (none)");
        }
        for line in lines {
            println!("    {line}");
        }
    }
}
