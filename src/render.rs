use std::io::{self, Write};

use crate::vehicle::Vehicle;

pub fn render_vehicles(out: &mut impl Write, vehicles: &[Vehicle]) -> io::Result<()> {
    if vehicles.is_empty() {
        writeln!(
            out,
            "\nALFRED: Puxa, não encontrei nenhum veículo com esses critérios no nosso inventário."
        )?;
        return Ok(());
    }

    writeln!(
        out,
        "\nALFRED: Encontrei {} veículo(s) no inventário com esses filtros:",
        vehicles.len()
    )?;
    for (i, v) in vehicles.iter().enumerate() {
        writeln!(out, "\n--- Veículo {} ---", i + 1)?;
        writeln!(out, "  Marca: {} | Modelo: {}", v.brand, v.model)?;
        match v.final_year {
            Some(final_year) => writeln!(
                out,
                "  Ano Fab.: {} (Modelo até: {final_year})",
                v.initial_year
            )?,
            None => writeln!(out, "  Ano Fab.: {}", v.initial_year)?,
        }
        writeln!(
            out,
            "  Potência: {} CV | Combustível: {}",
            v.horsepower, v.fuel_type
        )?;
        writeln!(
            out,
            "  Portas: {} | Transmissão Automática: {}",
            v.door_count,
            if v.automatic_transmission { "Sim" } else { "Não" }
        )?;
        if let Some(trunk) = v.trunk_liters {
            writeln!(out, "  Porta-malas: {trunk} L")?;
        }
        if let Some(cargo) = v.cargo_capacity_kg {
            writeln!(out, "  Capacidade de carga: {cargo} kg")?;
        }
        if let Some(tank) = v.tank_liters {
            writeln!(out, "  Tanque: {tank} L")?;
        }
        if let Some(efficiency) = v.efficiency_km_l {
            writeln!(out, "  Autonomia: {efficiency} km/l")?;
        }
    }
    writeln!(out, "\n--------------------")
}
