/// Fire-and-forget sound effects. The simulation only ever asks for a
/// sound to start; mixing and channel management live behind the sink.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SoundId {
    Music,
    Jump,
    Attack,
    Explosion,
    GameOver,
    Clapping,
    Win,
}

impl SoundId {
    pub fn file_name(self) -> &'static str {
        match self {
            SoundId::Music => "music.wav",
            SoundId::Jump => "jump.wav",
            SoundId::Attack => "attack.wav",
            SoundId::Explosion => "bomb.wav",
            SoundId::GameOver => "game_over.wav",
            SoundId::Clapping => "clapping.wav",
            SoundId::Win => "win.wav",
        }
    }
}

pub trait AudioSink {
    fn play(&mut self, sound: SoundId);
}

/// Sink that drops every request; used headless.
#[derive(Debug, Default)]
pub struct NullAudio;

impl AudioSink for NullAudio {
    fn play(&mut self, _sound: SoundId) {}
}

/// Test double that remembers what was played, in order.
#[derive(Debug, Default)]
pub struct RecordingAudio {
    pub played: Vec<SoundId>,
}

impl RecordingAudio {
    pub fn count(&self, sound: SoundId) -> usize {
        self.played.iter().filter(|s| **s == sound).count()
    }
}

impl AudioSink for RecordingAudio {
    fn play(&mut self, sound: SoundId) {
        self.played.push(sound);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn recording_sink_keeps_playback_order() {
        let mut sink = RecordingAudio::default();
        sink.play(SoundId::Jump);
        sink.play(SoundId::Attack);
        sink.play(SoundId::Jump);
        assert_eq!(
            sink.played,
            vec![SoundId::Jump, SoundId::Attack, SoundId::Jump]
        );
        assert_eq!(sink.count(SoundId::Jump), 2);
    }
}
