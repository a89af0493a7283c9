use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, Result, bail};
use colored::Colorize;
use config::{Config, EndpointDraft, FileStore, SettingsStore, preset_template};
use http_client::Client;
use log::{error, info};
use page::{HtmlPage, PageTranslator, Selection};
use protocol::{TranslateRequest, TranslationProgress};
use tokio::fs;
use tokio::io::{self, BufReader};
use tokio::sync::mpsc;
use translator::{InferenceClient, Translator};

use super::background::Background;
use super::bar::Bar;
use super::channel::LocalChannel;
use super::cli::{Command, EndpointArgs, EndpointCommand};

pub struct App {
    config: Config,
    settings: SettingsStore,
}

impl App {
    pub fn new(config: Config) -> App {
        let store = FileStore::new(&config.storage.path);
        let settings = SettingsStore::new(Arc::new(store));

        App { config, settings }
    }

    pub async fn run(&self, command: Command) -> Result<()> {
        match command {
            Command::Translate {
                input,
                output,
                encoding,
            } => {
                let output = output.unwrap_or_else(|| default_output(&input));
                self.translate_page(&input, &output, &encoding).await
            }
            Command::Text { text } => self.translate_text(text).await,
            Command::Endpoint(command) => self.endpoint(command).await,
            Command::Serve => {
                let background = self.background().with_context(|| "build background")?;
                background
                    .serve(BufReader::new(io::stdin()), io::stdout())
                    .await
            }
        }
    }

    fn background(&self) -> Result<Background> {
        let network = &self.config.network;
        let client = Client::builder()
            .maybe_proxy(network.proxy.clone())
            .build()
            .with_context(|| "build http client")?;
        let translator = Translator::builder()
            .settings(self.settings.clone())
            .client(InferenceClient::new(client))
            .timeout(network.timeout())
            .build();

        Ok(Background::new(translator))
    }

    async fn translate_page(&self, input: &Path, output: &Path, encoding: &str) -> Result<()> {
        if self.settings.get_active_endpoint().await?.is_none() {
            bail!("No active endpoint configured");
        }
        let data = fs::read(input)
            .await
            .with_context(|| format!("read {}", input.display()))?;
        let mut page = HtmlPage::decode(&data, encoding)
            .with_context(|| format!("decode {} as {encoding}", input.display()))?;

        let background = Arc::new(self.background().with_context(|| "build background")?);
        let (tx, mut rx) = mpsc::unbounded_channel();
        let language = &self.config.language;
        let runner = PageTranslator::builder()
            .channel(LocalChannel::new(background, tx))
            .selection(Selection::new(self.config.page.min_length))
            .source_lang(language.source.clone())
            .target_lang(language.target.clone())
            .build();

        let bar = Arc::new(Bar::new().await);
        bar.message(format!("translate {}", input.display()));
        let watcher = tokio::spawn({
            let bar = bar.clone();
            async move {
                while let Some(progress) = rx.recv().await {
                    bar.update(progress).await;
                }
            }
        });

        let result = runner.start_extraction(&mut page).await;
        drop(runner);
        watcher.await.with_context(|| "wait for progress listener")?;
        let progress = bar.progress().await.unwrap_or_default();
        bar.finish().await;

        if !result.success {
            bail!(result.error.unwrap_or_else(|| "translation failed".to_string()));
        }
        fs::write(output, page.to_html()?)
            .await
            .with_context(|| format!("write {}", output.display()))?;
        summary(&progress, output);

        Ok(())
    }

    async fn translate_text(&self, text: String) -> Result<()> {
        let language = &self.config.language;
        let request = TranslateRequest::new(text)
            .with_langs(Some(language.source.clone()), Some(language.target.clone()));
        let response = self.background()?.translator().translate(&request).await;

        if !response.success {
            let err = response.error.unwrap_or_default();
            error!("{err}");
            bail!(err);
        }
        println!("{}", response.translated_text.green());

        Ok(())
    }

    async fn endpoint(&self, command: EndpointCommand) -> Result<()> {
        let mut settings = self.settings.get_settings().await?;
        match command {
            EndpointCommand::List => {
                let active = settings.active_endpoint().map(|endpoint| endpoint.id.as_str());
                for endpoint in settings.endpoints.iter() {
                    let line = format!(
                        "{} {} [{}] {} {}",
                        if active == Some(endpoint.id.as_str()) { "*" } else { " " },
                        endpoint.name,
                        endpoint.api_type,
                        endpoint.model,
                        endpoint.url,
                    );
                    println!("{line}");
                    println!("    {}", endpoint.id.dimmed());
                }
                return Ok(());
            }
            EndpointCommand::Preset { api_type } => {
                match preset_template(api_type) {
                    Some(template) => println!("{template}"),
                    None => println!("{}", format!("no preset for {api_type}").yellow()),
                }
                return Ok(());
            }
            EndpointCommand::Add(args) => {
                let endpoint = settings.add_endpoint(draft(args)?)?;
                info!("added endpoint {}", endpoint.id);
                println!("{} {}", "added".green(), endpoint.id);
            }
            EndpointCommand::Update { id, args } => {
                if !settings.update_endpoint(&id, draft(args)?)? {
                    bail!("endpoint {id} not found");
                }
                println!("{} {id}", "updated".green());
            }
            EndpointCommand::Remove { id } => {
                if !settings.remove_endpoint(&id) {
                    bail!("endpoint {id} not found");
                }
                println!("{} {id}", "removed".green());
            }
            EndpointCommand::Use { id } => {
                if settings.endpoint(&id).is_none() {
                    bail!("endpoint {id} not found");
                }
                self.settings.set_active_endpoint(&id).await?;
                println!("{} {id}", "active".green());
                return Ok(());
            }
        }

        self.settings.save_settings(&settings).await
    }
}

fn draft(args: EndpointArgs) -> Result<EndpointDraft> {
    let prompt_template = match args.template {
        Some(template) => template,
        None => match preset_template(args.api_type) {
            Some(template) => template.to_string(),
            None => bail!("--template is required for {}", args.api_type),
        },
    };

    Ok(EndpointDraft {
        name: args.name,
        url: args.url,
        api_type: args.api_type,
        model: args.model,
        prompt_template,
    })
}

fn default_output(input: &Path) -> PathBuf {
    let stem = input
        .file_stem()
        .map(|stem| stem.to_string_lossy().to_string())
        .unwrap_or_else(|| "page".to_string());

    input.with_file_name(format!("{stem}.translated.html"))
}

fn summary(progress: &TranslationProgress, output: &Path) {
    println!("{:=^width$}", " Summary ".yellow(), width = *app::LINE_LENGTH);

    let ok = format!("ok: {}", progress.completed - progress.failed);
    info!("{ok}");
    println!("{}", ok.green());

    let failed = format!("failed: {}", progress.failed);
    info!("{failed}");
    println!("{}", failed.red());

    println!("saved to {}", output.display());
}
