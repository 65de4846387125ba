//! Tank power balance computation.

/// Computes the net power into the tank from the step's power terms.
///
/// All inputs are non-negative magnitudes: sources add heat, losses and the
/// draw-off remove it. This function performs pure summation.
///
/// # Arguments
///
/// * `heat_pump_w` - Heat-pump power delivered to the tank
/// * `backup_w` - Backup-boiler power delivered to the tank
/// * `tank_loss_w` - Shell loss towards the plant room
/// * `loop_loss_w` - Recirculation-loop loss
/// * `draw_off_w` - Power carried away by the draw-off
///
/// # Returns
///
/// Net power in W (positive = tank heats up)
pub fn tank_net_w(
    heat_pump_w: f64,
    backup_w: f64,
    tank_loss_w: f64,
    loop_loss_w: f64,
    draw_off_w: f64,
) -> f64 {
    heat_pump_w + backup_w - tank_loss_w - loop_loss_w - draw_off_w
}
