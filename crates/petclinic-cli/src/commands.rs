//! Subcommands and their execution.

use std::path::{Path, PathBuf};

use anyhow::{bail, Context};
use clap::{Args, Subcommand, ValueEnum};
use petclinic_core::flows::{
    self, require_selection, CategoryListing, Confirm, FlowOutcome, ListedRecord, SELECT_PET,
};
use petclinic_core::models::{
    AppointmentPatch, MedicalPatch, NewAppointment, NewMedicalRecord, NewOwner, NewPet,
    NewVaccineRecord, NewWeightEntry, OwnerPatch, PetPatch, VaccinePatch, WeightPatch,
};
use petclinic_core::{
    AppointmentRecord, ClinicApp, MedicalRecord, RecordRow, VaccineRecord, WeightEntry,
};

use crate::output;

pub struct RunOptions {
    pub assume_yes: bool,
    pub json: bool,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Log in and remember the profile
    Login {
        email: String,
        /// Prompted for when omitted
        #[arg(long)]
        password: Option<String>,
    },
    /// Register a new vet account
    Register {
        name: String,
        email: String,
        #[arg(long)]
        password: Option<String>,
    },
    /// Forget the stored profile
    Logout,
    /// Show the stored profile
    Whoami,
    /// Clinic summary
    Dashboard,
    /// Manage pets
    Pets {
        #[command(subcommand)]
        action: PetCommand,
    },
    /// Manage owners
    Owners {
        #[command(subcommand)]
        action: OwnerCommand,
    },
    /// Medical, vaccine, weight and appointment records
    Records {
        #[arg(value_enum)]
        category: CategoryArg,
        #[command(subcommand)]
        action: RecordCommand,
    },
    /// Weight history
    Weight {
        #[command(subcommand)]
        action: WeightCommand,
    },
    /// Upload a file and print its URL
    Upload { file: PathBuf },
    /// Ask the prediction service
    Predict {
        #[command(subcommand)]
        action: PredictCommand,
    },
}

#[derive(Subcommand)]
pub enum PetCommand {
    /// List all pets
    List,
    /// Pet picker entries
    Options,
    /// One pet with all of its records
    Show { pet: String },
    /// Add a pet
    Add {
        name: String,
        #[arg(long)]
        age: u32,
        #[arg(long = "type")]
        species: String,
        /// Owner as "Name (ID: x)" or a bare ID
        #[arg(long)]
        owner: String,
        #[arg(long)]
        photo: Option<String>,
        /// Upload this file and use it as the photo
        #[arg(long, conflicts_with = "photo")]
        photo_file: Option<PathBuf>,
    },
    /// Edit a pet
    Edit {
        pet: String,
        #[arg(long)]
        name: Option<String>,
        #[arg(long)]
        age: Option<u32>,
        #[arg(long = "type")]
        species: Option<String>,
        #[arg(long)]
        photo: Option<String>,
        #[arg(long)]
        owner: Option<String>,
    },
    /// Delete a pet
    Delete { pet: String },
    /// Pets of one owner
    Owner { owner: String },
}

#[derive(Subcommand)]
pub enum OwnerCommand {
    List,
    /// Owner picker entries
    Options,
    Add {
        /// National ID number
        id: String,
        name: String,
        #[arg(long, default_value = "")]
        phone: String,
        #[arg(long, default_value = "")]
        address: String,
        #[arg(long, default_value = "")]
        email: String,
    },
    Edit {
        owner: String,
        #[arg(long)]
        name: Option<String>,
        #[arg(long)]
        phone: Option<String>,
        #[arg(long)]
        address: Option<String>,
    },
    Delete { owner: String },
}

#[derive(Clone, Copy, ValueEnum)]
pub enum CategoryArg {
    Medical,
    Vaccine,
    Weight,
    Appointment,
}

#[derive(Subcommand)]
pub enum RecordCommand {
    /// List records, optionally filtered by pet
    List {
        /// Pet name, "Name (ID: x)" or part of a name
        #[arg(long, short, default_value = "")]
        query: String,
    },
    Add {
        /// Pet as "Name (ID: x)" or a bare ID
        #[arg(long)]
        pet: String,
        #[command(flatten)]
        fields: RecordFields,
    },
    Edit {
        id: String,
        #[command(flatten)]
        fields: RecordFields,
    },
    Delete { id: String },
}

/// Field flags shared by every category; each category reads its own.
#[derive(Args, Default)]
pub struct RecordFields {
    #[arg(long)]
    date: Option<String>,
    #[arg(long)]
    diagnosis: Option<String>,
    #[arg(long)]
    treatment: Option<String>,
    #[arg(long)]
    notes: Option<String>,
    #[arg(long)]
    attachment: Option<String>,
    #[arg(long)]
    vaccine: Option<String>,
    #[arg(long)]
    given: Option<String>,
    #[arg(long)]
    next_due: Option<String>,
    #[arg(long)]
    weight: Option<f64>,
    #[arg(long)]
    time: Option<String>,
    #[arg(long)]
    reason: Option<String>,
    /// Vet as "Name (ID: x)" or a bare ID
    #[arg(long)]
    vet: Option<String>,
}

#[derive(Subcommand)]
pub enum WeightCommand {
    /// Weight chart, optionally filtered by pet
    Chart {
        #[arg(long, short, default_value = "")]
        query: String,
    },
}

#[derive(Subcommand)]
pub enum PredictCommand {
    Lifespan { age: f64 },
    Health { age: f64, weight: f64 },
    Breed { age: f64 },
}

/// Maps CLI field flags onto a category's request bodies.
trait RecordInput: ListedRecord {
    fn new_fields(pet_id: String, fields: RecordFields) -> anyhow::Result<Self::New>;
    fn patch(fields: RecordFields) -> Self::Patch;
}

impl RecordInput for MedicalRecord {
    fn new_fields(pet_id: String, f: RecordFields) -> anyhow::Result<Self::New> {
        Ok(NewMedicalRecord {
            pet_id,
            date: f.date.unwrap_or_default(),
            diagnosis: f.diagnosis.unwrap_or_default(),
            treatment: f.treatment.unwrap_or_default(),
            notes: f.notes.unwrap_or_default(),
            attachment: f.attachment.unwrap_or_default(),
        })
    }

    fn patch(f: RecordFields) -> Self::Patch {
        MedicalPatch {
            diagnosis: f.diagnosis,
            treatment: f.treatment,
            notes: f.notes,
            date: f.date,
        }
    }
}

impl RecordInput for VaccineRecord {
    fn new_fields(pet_id: String, f: RecordFields) -> anyhow::Result<Self::New> {
        Ok(NewVaccineRecord {
            pet_id,
            vaccine_name: f.vaccine.unwrap_or_default(),
            date_given: f.given.unwrap_or_default(),
            next_due: f.next_due.unwrap_or_default(),
        })
    }

    fn patch(f: RecordFields) -> Self::Patch {
        VaccinePatch {
            vaccine_name: f.vaccine,
            date_given: f.given,
            next_due: f.next_due,
        }
    }
}

impl RecordInput for WeightEntry {
    fn new_fields(pet_id: String, f: RecordFields) -> anyhow::Result<Self::New> {
        let Some(weight) = f.weight else {
            bail!("--weight is required");
        };
        Ok(NewWeightEntry {
            pet_id,
            weight,
            date: f.date.unwrap_or_default(),
        })
    }

    fn patch(f: RecordFields) -> Self::Patch {
        WeightPatch {
            weight: f.weight,
            date: f.date,
        }
    }
}

impl RecordInput for AppointmentRecord {
    fn new_fields(pet_id: String, f: RecordFields) -> anyhow::Result<Self::New> {
        let vet_id = f
            .vet
            .as_deref()
            .and_then(petclinic_core::selection_id)
            .unwrap_or_default();
        Ok(NewAppointment {
            pet_id,
            date: f.date.unwrap_or_default(),
            time: f.time.unwrap_or_default(),
            reason: f.reason.unwrap_or_default(),
            vet_id,
        })
    }

    fn patch(f: RecordFields) -> Self::Patch {
        AppointmentPatch {
            date: f.date,
            time: f.time,
            reason: f.reason,
        }
    }
}

/// Confirmation through an interactive prompt, or unconditional with `--yes`.
struct PromptConfirm {
    assume_yes: bool,
}

impl Confirm for PromptConfirm {
    fn confirm(&self, prompt: &str) -> bool {
        if self.assume_yes {
            return true;
        }
        dialoguer::Confirm::new()
            .with_prompt(prompt)
            .default(false)
            .interact()
            .unwrap_or(false)
    }
}

fn password_or_prompt(password: Option<String>) -> anyhow::Result<String> {
    match password {
        Some(p) => Ok(p),
        None => Ok(dialoguer::Password::new()
            .with_prompt("Password")
            .interact()?),
    }
}

fn print_listing(listing: &CategoryListing, options: &RunOptions) -> anyhow::Result<()> {
    if options.json {
        return output::print_json(listing);
    }
    output::print_rows(&listing.rows);
    Ok(())
}

fn print_cards(rows: &[RecordRow], options: &RunOptions) -> anyhow::Result<()> {
    if options.json {
        return output::print_json(rows);
    }
    output::print_rows(rows);
    Ok(())
}

fn report_declined<T>(outcome: FlowOutcome<T>) -> Option<T> {
    let done = outcome.done();
    if done.is_none() {
        println!("Cancelled.");
    }
    done
}

async fn upload_path(app: &ClinicApp, path: &Path) -> anyhow::Result<String> {
    let bytes = std::fs::read(path).with_context(|| format!("reading {}", path.display()))?;
    let file_name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| "upload".to_string());
    Ok(app.upload(&file_name, bytes).await?)
}

pub async fn run(app: &ClinicApp, command: Commands, options: &RunOptions) -> anyhow::Result<()> {
    let confirm = PromptConfirm {
        assume_yes: options.assume_yes,
    };

    match command {
        Commands::Login { email, password } => {
            let password = password_or_prompt(password)?;
            let user = app.login(&email, &password).await?;
            println!("Logged in as {} ({})", user.name, user.id);
        }
        Commands::Register {
            name,
            email,
            password,
        } => {
            let password = password_or_prompt(password)?;
            app.register(&name, &email, &password).await?;
            println!("Registration successful! Please login.");
        }
        Commands::Logout => {
            app.logout()?;
            println!("Logged out.");
        }
        Commands::Whoami => match app.current_user()? {
            Some(user) if options.json => output::print_json(&user)?,
            Some(user) => println!("{} ({}, {:?})", user.name, user.id, user.role),
            None => println!("Not logged in."),
        },
        Commands::Dashboard => {
            let summary = app.dashboard(chrono::Local::now().date_naive()).await?;
            if options.json {
                output::print_json(&summary)?;
            } else {
                output::print_dashboard(&summary);
            }
        }
        Commands::Pets { action } => run_pets(app, action, &confirm, options).await?,
        Commands::Owners { action } => run_owners(app, action, &confirm, options).await?,
        Commands::Records { category, action } => match category {
            CategoryArg::Medical => run_records::<MedicalRecord>(app, action, &confirm, options).await?,
            CategoryArg::Vaccine => run_records::<VaccineRecord>(app, action, &confirm, options).await?,
            CategoryArg::Weight => run_records::<WeightEntry>(app, action, &confirm, options).await?,
            CategoryArg::Appointment => {
                run_records::<AppointmentRecord>(app, action, &confirm, options).await?
            }
        },
        Commands::Weight {
            action: WeightCommand::Chart { query },
        } => {
            let listing = app.search::<WeightEntry>(&query).await?;
            let chart = listing.chart.unwrap_or_default();
            if options.json {
                output::print_json(&chart)?;
            } else {
                output::print_chart(&chart);
            }
        }
        Commands::Upload { file } => {
            let url = upload_path(app, &file).await?;
            println!("{url}");
        }
        Commands::Predict { action } => {
            let prediction = match action {
                PredictCommand::Lifespan { age } => app.predict_lifespan(age).await?,
                PredictCommand::Health { age, weight } => app.predict_health_score(age, weight).await?,
                PredictCommand::Breed { age } => app.predict_breed_risk(age).await?,
            };
            println!("{prediction}");
        }
    }
    Ok(())
}

async fn run_pets(
    app: &ClinicApp,
    action: PetCommand,
    confirm: &PromptConfirm,
    options: &RunOptions,
) -> anyhow::Result<()> {
    let store = app.store();
    match action {
        PetCommand::List => print_cards(&flows::list_pets(store).await?, options)?,
        PetCommand::Options => output::print_options(&app.pet_options().await?),
        PetCommand::Show { pet } => {
            let id = require_selection(&pet, SELECT_PET)?;
            match app.pet_detail(&id).await? {
                Some(detail) if options.json => output::print_json(&detail)?,
                Some(detail) => output::print_detail(&detail),
                None => println!("Pet Not Found"),
            }
        }
        PetCommand::Add {
            name,
            age,
            species,
            owner,
            photo,
            photo_file,
        } => {
            let owner_id = require_selection(&owner, flows::SELECT_OWNER)?;
            let photo = match photo_file {
                Some(path) => Some(upload_path(app, &path).await?),
                None => photo,
            };
            let pet = NewPet::new(name, age, species, owner_id, photo);
            print_cards(&flows::add_pet(store, &pet).await?, options)?;
        }
        PetCommand::Edit {
            pet,
            name,
            age,
            species,
            photo,
            owner,
        } => {
            let id = require_selection(&pet, SELECT_PET)?;
            let owner_id = owner.as_deref().and_then(petclinic_core::selection_id);
            let patch = PetPatch {
                name,
                age,
                species,
                photo,
                owner_id,
            };
            print_cards(&flows::edit_pet(store, &id, &patch).await?, options)?;
        }
        PetCommand::Delete { pet } => {
            let id = require_selection(&pet, SELECT_PET)?;
            if let Some(cards) = report_declined(flows::delete_pet(store, &id, confirm).await?) {
                print_cards(&cards, options)?;
            }
        }
        PetCommand::Owner { owner } => {
            let owner_id = require_selection(&owner, flows::SELECT_OWNER)?;
            let pets = app.owner_pets(&owner_id).await?;
            if options.json {
                output::print_json(&pets)?;
            } else if pets.is_empty() {
                println!("No pets found for this owner.");
            } else {
                for pet in pets {
                    println!("{} - {} - Age: {}", pet.picker_value(), pet.species, pet.age_label());
                }
            }
        }
    }
    Ok(())
}

async fn run_owners(
    app: &ClinicApp,
    action: OwnerCommand,
    confirm: &PromptConfirm,
    options: &RunOptions,
) -> anyhow::Result<()> {
    let store = app.store();
    match action {
        OwnerCommand::List => print_cards(&flows::list_owners(store).await?, options)?,
        OwnerCommand::Options => output::print_options(&app.owner_options().await?),
        OwnerCommand::Add {
            id,
            name,
            phone,
            address,
            email,
        } => {
            let owner = NewOwner {
                id,
                name,
                phone,
                address,
                email,
            };
            print_cards(&flows::add_owner(store, &owner).await?, options)?;
        }
        OwnerCommand::Edit {
            owner,
            name,
            phone,
            address,
        } => {
            let id = require_selection(&owner, flows::SELECT_OWNER)?;
            let patch = OwnerPatch {
                name,
                phone,
                address,
            };
            print_cards(&flows::edit_owner(store, &id, &patch).await?, options)?;
        }
        OwnerCommand::Delete { owner } => {
            let id = require_selection(&owner, flows::SELECT_OWNER)?;
            if let Some(cards) = report_declined(flows::delete_owner(store, &id, confirm).await?) {
                print_cards(&cards, options)?;
            }
        }
    }
    Ok(())
}

async fn run_records<R: RecordInput>(
    app: &ClinicApp,
    action: RecordCommand,
    confirm: &PromptConfirm,
    options: &RunOptions,
) -> anyhow::Result<()> {
    let store = app.store();
    match action {
        RecordCommand::List { query } => {
            let listing = app.search::<R>(&query).await?;
            print_listing(&listing, options)?;
        }
        RecordCommand::Add { pet, fields } => {
            let pet_id = require_selection(&pet, SELECT_PET)?;
            let new = R::new_fields(pet_id, fields)?;
            let token = app.open_page(petclinic_core::Page::for_category(R::CATEGORY));
            print_listing(&flows::add_record::<R>(store, &new, &token).await?, options)?;
        }
        RecordCommand::Edit { id, fields } => {
            let patch = R::patch(fields);
            let token = app.open_page(petclinic_core::Page::for_category(R::CATEGORY));
            print_listing(&flows::edit_record::<R>(store, &id, &patch, &token).await?, options)?;
        }
        RecordCommand::Delete { id } => {
            let token = app.open_page(petclinic_core::Page::for_category(R::CATEGORY));
            let outcome = flows::delete_record::<R>(store, &id, confirm, &token).await?;
            if let Some(listing) = report_declined(outcome) {
                print_listing(&listing, options)?;
            }
        }
    }
    Ok(())
}
