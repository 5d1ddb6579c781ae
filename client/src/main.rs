use clap::Parser;
use intake_client::form::ApplicationForm;
use intake_client::session::SubmissionSession;
use intake_shared::{Application, SubmissionRequest, DEFAULT_HOST, DEFAULT_PORT};
use log::info;
use std::process::ExitCode;

#[derive(Parser, Debug)]
#[command(author, version, about = "Submit one admission application", long_about = None)]
struct Args {
    /// Server address to connect to (defaults to 127.0.0.1:5555)
    #[arg(short = 's', long)]
    server: Option<String>,

    /// Shared secret expected by the server
    #[arg(long, env = "INTAKE_AUTH_KEY", hide_env_values = true)]
    auth_key: String,

    /// Full name
    #[arg(long)]
    name: String,

    #[arg(long)]
    address: String,

    /// Educational qualifications
    #[arg(long)]
    qualifications: String,

    /// 1 = MSc in Cyber Security, 2 = MSc Information Systems & Computing,
    /// 3 = MSc Data Analytics (or the full title)
    #[arg(short = 'c', long)]
    course: String,

    /// Intended start year (2024-2030)
    #[arg(short = 'y', long)]
    start_year: i64,

    /// Intended start month, by name or number
    #[arg(short = 'm', long)]
    start_month: String,
}

#[tokio::main]
async fn main() -> ExitCode {
    env_logger::init();

    let args = Args::parse();
    let server = args
        .server
        .unwrap_or_else(|| format!("{}:{}", DEFAULT_HOST, DEFAULT_PORT));

    let form = ApplicationForm {
        name: args.name,
        address: args.address,
        qualifications: args.qualifications,
        course: args.course,
        start_year: args.start_year,
        start_month: args.start_month,
    };
    let application = match form.into_application() {
        Ok(application) => application,
        Err(e) => {
            eprintln!("Invalid application: {}", e);
            return ExitCode::FAILURE;
        }
    };

    print_summary(&application);

    let session = SubmissionSession::new(server);
    info!("Submitting application to {}", session.server());

    match session
        .submit(&SubmissionRequest::new(application, args.auth_key))
        .await
    {
        Ok(response) if response.success => {
            println!("APPLICATION SUCCESSFUL");
            println!(
                "Your Registration Number: {}",
                response.registration_number.unwrap_or_default()
            );
            println!("Please keep this number for all future correspondence.");
            ExitCode::SUCCESS
        }
        Ok(response) => {
            println!("APPLICATION FAILED");
            println!(
                "Error: {}",
                response.error.as_deref().unwrap_or("Unknown error")
            );
            ExitCode::FAILURE
        }
        Err(e) if e.is_transport() => {
            eprintln!("Could not reach the admission server: {}", e);
            eprintln!("Please check that the server is running and try again.");
            ExitCode::FAILURE
        }
        Err(e) => {
            eprintln!("Submission failed: {}", e);
            ExitCode::FAILURE
        }
    }
}

fn print_summary(application: &Application) {
    println!("Name: {}", application.name);
    println!("Address: {}", application.address);
    println!("Qualifications: {}", application.educational_qualifications);
    println!("Course: {}", application.course);
    println!(
        "Start Date: {} {}",
        application.start_month, application.start_year
    );
}
