use std::io::{self, Write};

use tokio::io::{AsyncBufRead, AsyncBufReadExt};
use tracing::{info, warn};

use crate::{
    filter::FilterSet,
    gateway::{GatewayError, QueryGateway},
    llm::ChatBackend,
    parser::parse_filters,
    render::render_vehicles,
    trigger::{classify, TurnSignals},
};

pub const DEFAULT_EXIT_KEYWORD: &str = "sair";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Role {
    System,
    User,
    Assistant,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Turn {
    pub role: Role,
    pub content: String,
}

impl Turn {
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: Role::System,
            content: content.into(),
        }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            content: content.into(),
        }
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: Role::Assistant,
            content: content.into(),
        }
    }
}

/// State owned by one conversation: its history and the filters in effect.
#[derive(Debug, Clone)]
pub struct Session {
    history: Vec<Turn>,
    filters: FilterSet,
}

impl Session {
    pub fn new(system_prompt: impl Into<String>) -> Self {
        Self {
            history: vec![Turn::system(system_prompt)],
            filters: FilterSet::new(),
        }
    }

    pub fn history(&self) -> &[Turn] {
        &self.history
    }

    pub fn filters(&self) -> &FilterSet {
        &self.filters
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum State {
    AwaitingInput,
    ModelInvoked,
    FiltersUpdated,
    SearchDecision,
    Finished,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TurnOutcome {
    Continue,
    Exit,
}

/// Drives one session turn by turn.
///
/// Backend and gateway failures are reported to the user and never end the
/// conversation; only the exit keyword does.
pub struct Controller<B, G> {
    backend: B,
    gateway: G,
    session: Session,
    state: State,
    exit_keyword: String,
}

impl<B, G> Controller<B, G>
where
    B: ChatBackend,
    G: QueryGateway,
{
    pub fn new(backend: B, gateway: G, session: Session, exit_keyword: &str) -> Self {
        Self {
            backend,
            gateway,
            session,
            state: State::AwaitingInput,
            exit_keyword: exit_keyword.to_lowercase(),
        }
    }

    pub fn session(&self) -> &Session {
        &self.session
    }

    pub fn state(&self) -> State {
        self.state
    }

    pub async fn handle_turn(
        &mut self,
        input: &str,
        out: &mut impl Write,
    ) -> io::Result<TurnOutcome> {
        if self.state == State::Finished {
            return Ok(TurnOutcome::Exit);
        }
        let utterance = input.trim();
        if utterance.to_lowercase() == self.exit_keyword {
            self.state = State::Finished;
            writeln!(out, "\nALFRED: Entendido. Até a próxima!")?;
            return Ok(TurnOutcome::Exit);
        }
        if utterance.is_empty() {
            return Ok(TurnOutcome::Continue);
        }

        self.session.history.push(Turn::user(utterance));
        self.state = State::ModelInvoked;

        let reply = match self.backend.complete(&self.session.history).await {
            Ok(reply) if !reply.trim().is_empty() => reply,
            Ok(_) => {
                warn!("Model backend returned an empty reply");
                writeln!(
                    out,
                    "\nALFRED (ERRO): Desculpe, não obtive resposta do modelo. Pode repetir?"
                )?;
                self.state = State::AwaitingInput;
                return Ok(TurnOutcome::Continue);
            }
            Err(e) => {
                warn!("Model backend failed: {e:#}");
                writeln!(
                    out,
                    "\nALFRED (ERRO): Desculpe, não consegui pensar agora. Verifique se o servidor do modelo está ativo. ({e})"
                )?;
                self.state = State::AwaitingInput;
                return Ok(TurnOutcome::Continue);
            }
        };

        writeln!(out, "\nALFRED: {reply}")?;
        self.session.history.push(Turn::assistant(reply.as_str()));
        self.session.filters = parse_filters(&reply);
        self.state = State::FiltersUpdated;
        if self.session.filters.is_empty() {
            writeln!(out, "(Nenhum filtro ativo no momento.)")?;
        } else {
            writeln!(out, "(Filtros atuais: {})", self.session.filters)?;
        }

        self.state = State::SearchDecision;
        let trigger = classify(&TurnSignals::new(utterance, &reply, &self.session.filters));
        if let Some(trigger) = trigger {
            info!("Search triggered by {trigger:?}");
            self.search(out).await?;
        }

        self.state = State::AwaitingInput;
        Ok(TurnOutcome::Continue)
    }

    /// Prompts and handles lines from `input` until the exit keyword or end
    /// of input. Bytes that are not UTF-8 are replaced, never fatal.
    pub async fn run<R>(&mut self, mut input: R, out: &mut impl Write) -> io::Result<()>
    where
        R: AsyncBufRead + Unpin,
    {
        let mut buf = Vec::new();
        loop {
            write!(out, "\nVocê: ")?;
            out.flush()?;

            buf.clear();
            if input.read_until(b'\n', &mut buf).await? == 0 {
                writeln!(out)?;
                return Ok(());
            }
            let line = String::from_utf8_lossy(&buf);
            if self.handle_turn(&line, out).await? == TurnOutcome::Exit {
                return Ok(());
            }
        }
    }

    async fn search(&self, out: &mut impl Write) -> io::Result<()> {
        let filters = &self.session.filters;
        if filters.is_empty() {
            writeln!(
                out,
                "\nALFRED: Para buscar, preciso de pelo menos um critério. O que você gostaria de procurar?"
            )?;
            return Ok(());
        }

        writeln!(
            out,
            "\nALFRED: Entendido! Buscando no inventário com os filtros: {filters}"
        )?;
        match self.gateway.search(filters).await {
            Ok(vehicles) => render_vehicles(out, &vehicles),
            Err(e) => {
                warn!("Search failed: {e}");
                let message = match &e {
                    GatewayError::Connection { .. } => {
                        "Não consegui me conectar ao servidor de veículos. Verifique se ele está ativo."
                            .to_string()
                    }
                    GatewayError::Timeout(limit) => format!(
                        "O servidor de veículos não respondeu em {} segundos. Tente novamente.",
                        limit.as_secs()
                    ),
                    GatewayError::Http { status, body } => {
                        format!("O servidor de veículos recusou a busca (status {status}): {body}")
                    }
                    GatewayError::InvalidResponse(detail) => {
                        format!("O servidor de veículos enviou uma resposta inesperada: {detail}")
                    }
                };
                writeln!(out, "\nALFRED: {message}")
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use std::{
        collections::VecDeque,
        sync::{Arc, Mutex},
        time::Duration,
    };

    use anyhow::{bail, Result};
    use async_trait::async_trait;
    use reqwest::StatusCode;

    use super::*;
    use crate::{
        filter::FilterValue,
        gateway::HttpGateway,
        vehicle::{sample, Vehicle},
        vocabulary::FilterKey,
    };

    /// Answers with the scripted replies in order; `None` simulates an outage.
    struct ScriptedBackend {
        replies: Mutex<VecDeque<Option<String>>>,
        seen: Arc<Mutex<Vec<Vec<Turn>>>>,
    }

    impl ScriptedBackend {
        fn new(replies: &[Option<&str>]) -> (Self, Arc<Mutex<Vec<Vec<Turn>>>>) {
            let seen = Arc::new(Mutex::new(Vec::new()));
            let backend = Self {
                replies: Mutex::new(
                    replies
                        .iter()
                        .map(|reply| reply.map(str::to_string))
                        .collect(),
                ),
                seen: seen.clone(),
            };
            (backend, seen)
        }
    }

    #[async_trait]
    impl ChatBackend for ScriptedBackend {
        async fn complete(&self, history: &[Turn]) -> Result<String> {
            self.seen.lock().unwrap().push(history.to_vec());
            let next = self.replies.lock().unwrap().pop_front();
            match next {
                Some(Some(reply)) => Ok(reply),
                _ => bail!("connection refused"),
            }
        }
    }

    #[derive(Clone, Copy)]
    enum Answer {
        Vehicles,
        Timeout,
        Unprocessable,
    }

    struct RecordingGateway {
        answer: Answer,
        calls: Arc<Mutex<Vec<FilterSet>>>,
    }

    impl RecordingGateway {
        fn new(answer: Answer) -> (Self, Arc<Mutex<Vec<FilterSet>>>) {
            let calls = Arc::new(Mutex::new(Vec::new()));
            (
                Self {
                    answer,
                    calls: calls.clone(),
                },
                calls,
            )
        }
    }

    #[async_trait]
    impl QueryGateway for RecordingGateway {
        async fn search(&self, filters: &FilterSet) -> Result<Vec<Vehicle>, GatewayError> {
            self.calls.lock().unwrap().push(filters.clone());
            match self.answer {
                Answer::Vehicles => Ok(vec![sample("Jeep", "Compass", 185, "Flex")]),
                Answer::Timeout => Err(GatewayError::Timeout(Duration::from_secs(10))),
                Answer::Unprocessable => Err(GatewayError::Http {
                    status: StatusCode::UNPROCESSABLE_ENTITY,
                    body: "extra fields not permitted".to_string(),
                }),
            }
        }
    }

    fn new_controller<G: QueryGateway>(
        backend: ScriptedBackend,
        gateway: G,
    ) -> Controller<ScriptedBackend, G> {
        Controller::new(
            backend,
            gateway,
            Session::new("instruções"),
            DEFAULT_EXIT_KEYWORD,
        )
    }

    async fn say<B: ChatBackend, G: QueryGateway>(
        controller: &mut Controller<B, G>,
        input: &str,
    ) -> (TurnOutcome, String) {
        let mut out = Vec::new();
        let outcome = controller.handle_turn(input, &mut out).await.unwrap();
        (outcome, String::from_utf8(out).unwrap())
    }

    fn flex_filters() -> FilterSet {
        [
            (FilterKey::FuelType, FilterValue::Text("Flex".to_string())),
            (FilterKey::MinHorsepower, FilterValue::Integer(150)),
        ]
        .into_iter()
        .collect()
    }

    #[tokio::test]
    async fn search_verb_sends_latest_filters_once() {
        let (backend, seen) = ScriptedBackend::new(&[
            Some("Ótimo, um carro flex e potente.\nFILTROS_COLETADOS: combustivel=Flex, potencia_cv_min=150"),
            Some("Vou buscar para você.\nFILTROS_COLETADOS: combustivel=Flex, potencia_cv_min=150"),
        ]);
        let (gateway, calls) = RecordingGateway::new(Answer::Vehicles);
        let mut controller = new_controller(backend, gateway);

        let (outcome, text) = say(&mut controller, "quero um flex com mais de 150cv").await;
        assert_eq!(outcome, TurnOutcome::Continue);
        assert!(text.contains("Filtros atuais: combustivel=Flex, potencia_cv_min=150"));
        assert!(calls.lock().unwrap().is_empty());

        let (_, text) = say(&mut controller, "buscar").await;
        assert_eq!(*calls.lock().unwrap(), vec![flex_filters()]);
        assert!(text.contains("Marca: Jeep | Modelo: Compass"));

        let seen = seen.lock().unwrap();
        assert_eq!(seen[1].len(), 4);
        assert_eq!(seen[1][3], Turn::user("buscar"));
        assert_eq!(controller.state(), State::AwaitingInput);
    }

    #[tokio::test]
    async fn filters_are_replaced_not_merged() {
        let (backend, _) = ScriptedBackend::new(&[
            Some("FILTROS_COLETADOS: marca=Fiat"),
            Some("Anotado.\nFILTROS_COLETADOS: modelo=Uno"),
            Some("Sem problemas."),
        ]);
        let (gateway, _) = RecordingGateway::new(Answer::Vehicles);
        let mut controller = new_controller(backend, gateway);

        say(&mut controller, "gosto da Fiat").await;
        say(&mut controller, "na verdade, um Uno").await;
        let filters = controller.session().filters();
        assert_eq!(filters.len(), 1);
        assert_eq!(
            filters.get(FilterKey::Model),
            Some(&FilterValue::Text("Uno".to_string()))
        );

        let (_, text) = say(&mut controller, "esquece").await;
        assert!(controller.session().filters().is_empty());
        assert!(text.contains("Nenhum filtro ativo"));
    }

    #[tokio::test]
    async fn model_failure_keeps_filters_and_records_no_reply() {
        let (backend, seen) = ScriptedBackend::new(&[
            Some("FILTROS_COLETADOS: marca=Fiat"),
            None,
            Some("FILTROS_COLETADOS: marca=Fiat, num_portas=4"),
        ]);
        let (gateway, calls) = RecordingGateway::new(Answer::Vehicles);
        let mut controller = new_controller(backend, gateway);

        say(&mut controller, "gosto da Fiat").await;
        let (outcome, text) = say(&mut controller, "com 4 portas, pode buscar").await;
        assert_eq!(outcome, TurnOutcome::Continue);
        assert!(text.contains("ALFRED (ERRO)"));
        assert_eq!(controller.state(), State::AwaitingInput);
        assert_eq!(
            controller.session().filters().get(FilterKey::Brand),
            Some(&FilterValue::Text("Fiat".to_string()))
        );
        let history = controller.session().history();
        assert_eq!(history.len(), 4);
        assert_eq!(history[3].role, Role::User);
        assert!(calls.lock().unwrap().is_empty());

        say(&mut controller, "com 4 portas").await;
        assert_eq!(seen.lock().unwrap()[2].len(), 5);
        assert_eq!(controller.session().filters().len(), 2);
    }

    #[tokio::test]
    async fn empty_reply_keeps_filters_and_skips_search() {
        let (backend, _) = ScriptedBackend::new(&[
            Some("FILTROS_COLETADOS: marca=Fiat"),
            Some(""),
            Some("  \n "),
        ]);
        let (gateway, calls) = RecordingGateway::new(Answer::Vehicles);
        let mut controller = new_controller(backend, gateway);

        say(&mut controller, "gosto da Fiat").await;
        let (outcome, text) = say(&mut controller, "buscar").await;
        assert_eq!(outcome, TurnOutcome::Continue);
        assert!(text.contains("ALFRED (ERRO)"));
        assert!(!text.contains("preciso de pelo menos um critério"));
        assert!(calls.lock().unwrap().is_empty());

        say(&mut controller, "buscar").await;
        assert!(calls.lock().unwrap().is_empty());
        assert_eq!(controller.state(), State::AwaitingInput);
        assert_eq!(
            controller.session().filters().get(FilterKey::Brand),
            Some(&FilterValue::Text("Fiat".to_string()))
        );
        let history = controller.session().history();
        assert_eq!(history.len(), 5);
        assert!(history
            .iter()
            .all(|turn| turn.role != Role::Assistant || !turn.content.is_empty()));
        assert_eq!(history[4], Turn::user("buscar"));
    }

    #[tokio::test]
    async fn search_without_filters_asks_for_criteria() {
        let (backend, _) = ScriptedBackend::new(&[Some("Claro! O que você procura?\nFILTROS_COLETADOS: nenhum")]);
        let (gateway, calls) = RecordingGateway::new(Answer::Vehicles);
        let mut controller = new_controller(backend, gateway);

        let (_, text) = say(&mut controller, "buscar").await;
        assert!(text.contains("preciso de pelo menos um critério"));
        assert!(calls.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn model_offer_triggers_search_when_filters_exist() {
        let (backend, _) = ScriptedBackend::new(&[
            Some("Posso buscar carros da Fiat?\nFILTROS_COLETADOS: nenhum"),
            Some("Posso buscar carros da Fiat?\nFILTROS_COLETADOS: marca=Fiat"),
        ]);
        let (gateway, calls) = RecordingGateway::new(Answer::Vehicles);
        let mut controller = new_controller(backend, gateway);

        say(&mut controller, "oi").await;
        assert!(calls.lock().unwrap().is_empty());

        say(&mut controller, "Fiat").await;
        assert_eq!(calls.lock().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn unreachable_service_is_reported_and_state_kept() {
        let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);
        let gateway = HttpGateway::new(&format!("http://{addr}"), Duration::from_secs(5)).unwrap();

        let (backend, _) = ScriptedBackend::new(&[Some(
            "Buscando.\nFILTROS_COLETADOS: combustivel=Flex, potencia_cv_min=150",
        )]);
        let mut controller = new_controller(backend, gateway);

        let (outcome, text) = say(&mut controller, "buscar").await;
        assert_eq!(outcome, TurnOutcome::Continue);
        assert!(text.contains("Não consegui me conectar ao servidor de veículos"));
        assert_eq!(controller.state(), State::AwaitingInput);
        assert_eq!(controller.session().filters(), &flex_filters());
    }

    #[tokio::test]
    async fn gateway_failures_differ_from_no_matches() {
        let reply = "FILTROS_COLETADOS: marca=Fiat";

        let (backend, _) = ScriptedBackend::new(&[Some(reply)]);
        let (gateway, _) = RecordingGateway::new(Answer::Timeout);
        let mut controller = new_controller(backend, gateway);
        let (_, text) = say(&mut controller, "buscar").await;
        assert!(text.contains("não respondeu em 10 segundos"));
        assert!(!text.contains("não encontrei nenhum veículo"));

        let (backend, _) = ScriptedBackend::new(&[Some(reply)]);
        let (gateway, _) = RecordingGateway::new(Answer::Unprocessable);
        let mut controller = new_controller(backend, gateway);
        let (_, text) = say(&mut controller, "buscar").await;
        assert!(text.contains("status 422"));
        assert!(text.contains("extra fields not permitted"));
    }

    #[tokio::test]
    async fn exit_keyword_ends_without_calling_the_model() {
        let (backend, seen) = ScriptedBackend::new(&[]);
        let (gateway, _) = RecordingGateway::new(Answer::Vehicles);
        let mut controller = new_controller(backend, gateway);

        let (outcome, _) = say(&mut controller, "  SAIR ").await;
        assert_eq!(outcome, TurnOutcome::Exit);
        assert_eq!(controller.state(), State::Finished);
        assert!(seen.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn finished_session_ignores_further_input() {
        let (backend, seen) = ScriptedBackend::new(&[Some("FILTROS_COLETADOS: marca=Fiat")]);
        let (gateway, calls) = RecordingGateway::new(Answer::Vehicles);
        let mut controller = new_controller(backend, gateway);

        say(&mut controller, "sair").await;
        let (outcome, text) = say(&mut controller, "buscar carros da Fiat").await;
        assert_eq!(outcome, TurnOutcome::Exit);
        assert!(text.is_empty());
        assert_eq!(controller.state(), State::Finished);
        assert_eq!(controller.session().history().len(), 1);
        assert!(seen.lock().unwrap().is_empty());
        assert!(calls.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn run_survives_invalid_utf8_until_exit() {
        let (backend, seen) = ScriptedBackend::new(&[
            Some("Não entendi.\nFILTROS_COLETADOS: nenhum"),
            Some("FILTROS_COLETADOS: marca=Fiat"),
        ]);
        let (gateway, _) = RecordingGateway::new(Answer::Vehicles);
        let mut controller = new_controller(backend, gateway);

        let input: &[u8] = b"carro \xff\xfe barato\nFiat\nsair\nnunca lido\n";
        let mut out = Vec::new();
        controller.run(input, &mut out).await.unwrap();

        let seen = seen.lock().unwrap();
        assert_eq!(seen.len(), 2);
        assert_eq!(seen[0][1], Turn::user("carro \u{FFFD}\u{FFFD} barato"));
        assert_eq!(controller.state(), State::Finished);
        assert!(String::from_utf8(out).unwrap().contains("Até a próxima"));
    }

    #[tokio::test]
    async fn run_ends_at_end_of_input() {
        let (backend, seen) = ScriptedBackend::new(&[Some("FILTROS_COLETADOS: nenhum")]);
        let (gateway, _) = RecordingGateway::new(Answer::Vehicles);
        let mut controller = new_controller(backend, gateway);

        let input: &[u8] = b"oi";
        let mut out = Vec::new();
        controller.run(input, &mut out).await.unwrap();
        assert_eq!(seen.lock().unwrap().len(), 1);
        assert_eq!(controller.state(), State::AwaitingInput);
    }

    #[tokio::test]
    async fn blank_input_is_ignored() {
        let (backend, seen) = ScriptedBackend::new(&[]);
        let (gateway, _) = RecordingGateway::new(Answer::Vehicles);
        let mut controller = new_controller(backend, gateway);

        let (outcome, text) = say(&mut controller, "   ").await;
        assert_eq!(outcome, TurnOutcome::Continue);
        assert!(text.is_empty());
        assert_eq!(controller.session().history().len(), 1);
        assert!(seen.lock().unwrap().is_empty());
    }
}
