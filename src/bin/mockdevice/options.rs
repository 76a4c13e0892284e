use sattrak::options::SerialOptions;

#[derive(Debug, Clone, PartialEq, structopt::StructOpt)]
#[structopt(name = "mockdevice", about = "Simulated tracker microcontroller.")]
#[structopt(setting = structopt::clap::AppSettings::AllowNegativeNumbers)]
pub struct Options {
    #[structopt(flatten)]
    pub serial: SerialOptions,

    #[structopt(long, default_value = "20.0")]
    pub temperature: f64,

    #[structopt(long, default_value = "50.0")]
    pub humidity: f64,

    #[structopt(long, default_value = "40.972975")]
    pub latitude: f64,

    #[structopt(long, default_value = "-76.886064")]
    pub longitude: f64,
}
