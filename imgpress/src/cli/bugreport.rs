use bugreport::{
    bugreport,
    collector::{CompileTimeInformation, EnvironmentVariables, OperatingSystem, SoftwareVersion},
    format::Markdown,
};

pub fn run() {
    bugreport!()
        .info(SoftwareVersion::default())
        .info(OperatingSystem::default())
        .info(EnvironmentVariables::list(&[
            "IMGPRESS_PORT",
            "IMGPRESS_DATA_DIR",
            "IMGPRESS_DATA_FILE",
            "IMGPRESS_UPLOADS_DIR",
            "RUST_LOG",
        ]))
        .info(CompileTimeInformation::default())
        .print::<Markdown>();
}
