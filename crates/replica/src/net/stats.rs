#[derive(Debug, Clone, Default)]
pub struct LinkSimulation {
    pub loss_percent: f32,
    pub latency_ms: u32,
    pub jitter_ms: u32,
    pub reorder_percent: f32,
    /// Extra hold applied to a reordered packet.
    pub reorder_delay_ms: u32,
}

impl LinkSimulation {
    pub fn ideal(latency_ms: u32) -> Self {
        Self {
            latency_ms,
            ..Default::default()
        }
    }

    pub fn is_lossy(&self) -> bool {
        self.loss_percent > 0.0
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LinkStats {
    pub packets_sent: u64,
    pub packets_delivered: u64,
    pub packets_dropped: u64,
    pub packets_reordered: u64,
    pub bytes_sent: u64,
}

impl LinkStats {
    pub fn loss_percent(&self) -> f32 {
        if self.packets_sent == 0 {
            return 0.0;
        }
        self.packets_dropped as f32 / self.packets_sent as f32 * 100.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn loss_percent_of_sent_packets() {
        let mut stats = LinkStats::default();
        assert_eq!(stats.loss_percent(), 0.0);

        stats.packets_sent = 40;
        stats.packets_dropped = 10;
        assert_eq!(stats.loss_percent(), 25.0);
    }

    #[test]
    fn ideal_link_is_lossless() {
        let link = LinkSimulation::ideal(30);
        assert_eq!(link.latency_ms, 30);
        assert!(!link.is_lossy());
    }
}
