use std::path::Path;
use std::process::ExitCode;

use ::client::{render, Client, ClientError};

pub async fn upload(uri: &str, file: &str) -> ExitCode {
    report(async {
        let reply = Client::new(uri)?.upload(Path::new(file)).await?;
        println!("{}", reply.message);
        println!("{}", render::summary_table(&reply.image));
        Ok(())
    })
    .await
}

pub async fn list(uri: &str) -> ExitCode {
    report(async {
        let images = Client::new(uri)?.list().await?;
        if images.is_empty() {
            println!("No images yet");
        } else {
            println!("{}", render::images_table(&images));
        }
        Ok(())
    })
    .await
}

pub async fn download(uri: &str, id: &str, out: Option<&String>) -> ExitCode {
    report(async {
        let (path, size) = Client::new(uri)?
            .download(id, out.map(Path::new))
            .await?;
        println!("saved {} ({})", path.display(), render::kilobytes(size));
        Ok(())
    })
    .await
}

pub async fn analytics(uri: &str) -> ExitCode {
    report(async {
        let analytics = Client::new(uri)?.analytics().await?;
        println!("{}", render::analytics_table(&analytics));
        Ok(())
    })
    .await
}

async fn report<F>(action: F) -> ExitCode
where
    F: Future<Output = Result<(), ClientError>>,
{
    match action.await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("error: {e}");
            ExitCode::FAILURE
        }
    }
}
