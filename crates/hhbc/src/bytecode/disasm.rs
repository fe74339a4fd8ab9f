//! Textual rendering of single instructions.
//!
//! `Name imm imm ...`, with string and array ids resolved through the unit
//! when one is supplied.

use super::imm_vector::ImmVector;
use super::immediate::{Id, Imm, get_imms};
use super::member::{MCodeImm, get_m_location, get_m_vector};
use super::opcode::ArgType;
use super::subop::{IterKind, Subop};
use crate::error::Result;
use crate::unit::UnitLookup;

fn render_str(id: Id, unit: Option<&dyn UnitLookup>) -> String {
    match unit.and_then(|u| u.lookup_litstr(id)) {
        Some(s) => format!("{s:?}"),
        None => format!("S:{id}"),
    }
}

fn render_arr(id: Id, unit: Option<&dyn UnitLookup>) -> String {
    match unit.and_then(|u| u.lookup_array(id)) {
        Some(arr) => arr.to_string(),
        None => format!("A:{id}"),
    }
}

fn render_member_vector(vec: &ImmVector<'_>, unit: Option<&dyn UnitLookup>) -> Result<String> {
    let location = get_m_location(vec)?;
    let mut parts = vec![if location.lcode.num_imms() == 1 {
        format!("{}:{}", location.lcode.as_str(), location.imm)
    } else {
        location.lcode.as_str().to_owned()
    }];
    for item in get_m_vector(vec)? {
        let code = item.mcode.as_str();
        parts.push(match item.mcode.imm_kind() {
            MCodeImm::None => code.to_owned(),
            MCodeImm::Local | MCodeImm::Int => format!("{code}:{}", item.imm),
            MCodeImm::String => match item.str_id() {
                Some(id) => format!("{code}:{}", render_str(id, unit)),
                None => format!("{code}:?{}", item.imm),
            },
        });
    }
    Ok(format!("<{}>", parts.join(" ")))
}

fn render_vector(
    ty: ArgType,
    vec: &ImmVector<'_>,
    unit: Option<&dyn UnitLookup>,
) -> Result<String> {
    let parts: Vec<String> = match ty {
        ArgType::Ma => return render_member_vector(vec, unit),
        ArgType::Bla => vec.range32().map(|offset| offset.to_string()).collect(),
        ArgType::Vsa => vec.ids().map(|id| render_str(id, unit)).collect(),
        ArgType::Sla => {
            let items: Vec<_> = vec.str_vec().collect();
            let last = items.len().saturating_sub(1);
            items
                .iter()
                .enumerate()
                .map(|(i, item)| {
                    if i == last {
                        format!("-:{}", item.dest)
                    } else {
                        format!("{}:{}", render_str(item.str, unit), item.dest)
                    }
                })
                .collect()
        }
        ArgType::Ila => vec
            .iter_pairs()
            .map(|(kind, id)| {
                let kind = u8::try_from(kind)
                    .ok()
                    .and_then(IterKind::from_u8)
                    .map_or("?", IterKind::name);
                format!("({kind}) {id}")
            })
            .collect(),
        _ => unreachable!("{ty:?} is not a vector immediate"),
    };
    Ok(format!("<{}>", parts.join(" ")))
}

fn render_imm(ty: ArgType, imm: &Imm<'_>, unit: Option<&dyn UnitLookup>) -> Result<String> {
    Ok(match *imm {
        Imm::Iva(v) => v.to_string(),
        Imm::Local(id) => format!("L:{id}"),
        Imm::Iter(id) => format!("I:{id}"),
        Imm::Int64(v) => v.to_string(),
        Imm::Double(v) => format!("{v:?}"),
        Imm::Str(id) => render_str(id, unit),
        Imm::Arr(id) => render_arr(id, unit),
        Imm::Rat(rat) => rat.to_string(),
        Imm::Offset(offset) => offset.to_string(),
        Imm::Subop(kind, byte) => match kind.name_of(byte) {
            Some(name) => name.to_owned(),
            None => format!("?{byte}"),
        },
        Imm::Vector(ref vec) => render_vector(ty, vec, unit)?,
    })
}

/// Render the instruction at `pc`.
pub fn instr_to_string(bytes: &[u8], pc: usize, unit: Option<&dyn UnitLookup>) -> Result<String> {
    let (op, imms) = get_imms(bytes, pc)?;
    let mut out = op.name().to_owned();
    for (&ty, imm) in op.info().imms.iter().zip(&imms) {
        out.push(' ');
        out.push_str(&render_imm(ty, imm, unit)?);
    }
    Ok(out)
}
