//! 백그라운드 워커: 창 모드에서 업데이트/실행을 UI 루프 밖에서 처리
//!
//! ## 아키텍처
//! - `BackgroundWorker`: 독립적인 tokio 태스크로 실행, 태스크를 순서대로 하나씩 처리
//! - 진행 이벤트는 채널로 전달되며 UI는 매 틱마다 채널을 비움
//! - UI 스레드는 엔진을 직접 호출하지 않음

use std::sync::Arc;
use tokio::sync::{mpsc, RwLock};

use crate::check::{self, CheckResult};
use crate::launcher::LaunchOutcome;
use crate::{ProgressReporter, UpdateEvent, UpdateManager, UpdateOutcome};

/// 백그라운드 작업 타입
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BackgroundTask {
    /// 버전만 확인
    CheckVersion,
    /// 설치 또는 업데이트 (이미 최신이면 아무것도 하지 않음)
    InstallOrUpdate,
    /// 클라이언트 실행
    Launch,
    /// 워커 종료
    Shutdown,
}

impl BackgroundTask {
    fn describe(&self) -> &'static str {
        match self {
            BackgroundTask::CheckVersion => "Checking for updates...",
            BackgroundTask::InstallOrUpdate => "Installing Roblox...",
            BackgroundTask::Launch => "Launching Roblox...",
            BackgroundTask::Shutdown => "Shutting down",
        }
    }
}

/// 워커에서 UI로 전달되는 이벤트
#[derive(Debug, Clone, PartialEq)]
pub enum WorkerEvent {
    /// 작업 시작/종료
    Busy(bool),
    /// 엔진 진행 이벤트
    Update(UpdateEvent),
    /// 버전 체크 완료
    CheckFinished(CheckResult),
    /// 설치/업데이트 완료
    UpdateFinished(UpdateOutcome),
    /// 실행 완료
    LaunchFinished(LaunchOutcome),
    /// 워커 종료됨
    WorkerShutdown,
}

/// 백그라운드 워커 상태
#[derive(Debug, Clone, Default)]
pub struct WorkerStatus {
    /// 현재 작업 중인지
    pub busy: bool,
    /// 현재 태스크 설명
    pub current_task: Option<String>,
    /// 처리한 태스크 수
    pub completed_tasks: usize,
}

/// 진행 이벤트를 워커 채널로 전달
struct ChannelReporter {
    event_tx: mpsc::UnboundedSender<WorkerEvent>,
}

impl ProgressReporter for ChannelReporter {
    fn report(&self, event: UpdateEvent) {
        let _ = self.event_tx.send(WorkerEvent::Update(event));
    }
}

/// 백그라운드 워커
pub struct BackgroundWorker {
    /// 태스크 전송 채널
    task_tx: mpsc::Sender<BackgroundTask>,
    /// 워커 상태
    status: Arc<RwLock<WorkerStatus>>,
}

impl BackgroundWorker {
    /// 새 백그라운드 워커 생성 및 시작
    pub fn spawn(manager: Arc<UpdateManager>) -> (Self, mpsc::UnboundedReceiver<WorkerEvent>) {
        let (task_tx, task_rx) = mpsc::channel::<BackgroundTask>(32);
        let (event_tx, event_rx) = mpsc::unbounded_channel::<WorkerEvent>();
        let status = Arc::new(RwLock::new(WorkerStatus::default()));

        let worker = Self {
            task_tx,
            status: status.clone(),
        };

        tokio::spawn(async move {
            worker_loop(manager, task_rx, event_tx, status).await;
        });

        (worker, event_rx)
    }

    /// 태스크 제출 (대기하지 않음: UI 키 처리에서 호출)
    pub fn submit(&self, task: BackgroundTask) -> Result<(), String> {
        self.task_tx
            .try_send(task)
            .map_err(|e| format!("Failed to submit task: {}", e))
    }

    pub fn check_now(&self) -> Result<(), String> {
        self.submit(BackgroundTask::CheckVersion)
    }

    pub fn install(&self) -> Result<(), String> {
        self.submit(BackgroundTask::InstallOrUpdate)
    }

    pub fn launch(&self) -> Result<(), String> {
        self.submit(BackgroundTask::Launch)
    }

    /// 현재 상태 조회
    pub async fn get_status(&self) -> WorkerStatus {
        self.status.read().await.clone()
    }

    /// 워커 종료
    pub fn shutdown(&self) -> Result<(), String> {
        self.submit(BackgroundTask::Shutdown)
    }
}

/// 워커 메인 루프
async fn worker_loop(
    manager: Arc<UpdateManager>,
    mut task_rx: mpsc::Receiver<BackgroundTask>,
    event_tx: mpsc::UnboundedSender<WorkerEvent>,
    status: Arc<RwLock<WorkerStatus>>,
) {
    tracing::info!("[Worker] Background worker started");
    let reporter = ChannelReporter {
        event_tx: event_tx.clone(),
    };

    while let Some(task) = task_rx.recv().await {
        let finished = match task {
            BackgroundTask::Shutdown => {
                tracing::info!("[Worker] Shutdown requested");
                let _ = event_tx.send(WorkerEvent::WorkerShutdown);
                break;
            }
            BackgroundTask::CheckVersion => {
                begin_task(&status, &event_tx, task).await;
                WorkerEvent::CheckFinished(check::check_once(&manager).await)
            }
            BackgroundTask::InstallOrUpdate => {
                begin_task(&status, &event_tx, task).await;
                WorkerEvent::UpdateFinished(manager.update(&reporter).await)
            }
            BackgroundTask::Launch => {
                begin_task(&status, &event_tx, task).await;
                WorkerEvent::LaunchFinished(manager.launch(&reporter))
            }
        };
        let _ = event_tx.send(finished);

        {
            let mut s = status.write().await;
            s.busy = false;
            s.current_task = None;
            s.completed_tasks += 1;
        }
        let _ = event_tx.send(WorkerEvent::Busy(false));
    }

    tracing::info!("[Worker] Background worker stopped");
}

async fn begin_task(
    status: &Arc<RwLock<WorkerStatus>>,
    event_tx: &mpsc::UnboundedSender<WorkerEvent>,
    task: BackgroundTask,
) {
    {
        let mut s = status.write().await;
        s.busy = true;
        s.current_task = Some(task.describe().to_string());
    }
    let _ = event_tx.send(WorkerEvent::Busy(true));
    tracing::info!("[Worker] {:?} started", task);
}
