// Sound alert contract
use async_trait::async_trait;

/// Audio cues the machine may trigger alongside action handling
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SoundAlert {
    /// Generic cue played for button presses
    Press,
    /// Distinctive cue played when a giga shuffle begins
    Jackpot,
}

/// Fire-and-forget audio playback; the machine never awaits the outcome
#[async_trait]
pub trait SoundPlayer: Send + Sync {
    async fn play(&self, alert: SoundAlert, volume: u8);
}
