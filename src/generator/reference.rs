//! Seeded reference generator.
//!
//! Builds a population with the right shape for exercising the pipeline:
//!
//! - households of 1..=`max_household_size` around an adult head
//! - schools of `school_size` children aged 5-17, grouped by age
//! - workplaces of random size up to `max_workplace_size`
//! - a sparse random community layer
//! - (facility variant) elderly residents grouped into facilities with staff
//!
//! Every group is a clique, so school and work degrees routinely exceed the
//! default caps and trimming has work to do.

use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};

use crate::types::{
    FacilityRole, Layer, Location, Person, PersonId, Population, PopulationParams,
    PopulationSource, Sex,
};
use super::{FacilityGenerator, GenerationError, SyntheticGenerator};

/// Knobs of the reference generator.
#[derive(Debug, Clone)]
pub struct ReferenceGeneratorConfig {
    /// Largest household.
    pub max_household_size: usize,
    /// Children per school.
    pub school_size: usize,
    /// Largest workplace.
    pub max_workplace_size: usize,
    /// Share of working-age adults with a workplace.
    pub employment_rate: f64,
    /// Random community contacts initiated per person.
    pub community_contacts: usize,
    /// Share of people aged 70+ living in a facility.
    pub ltcf_resident_rate: f64,
    /// Residents per facility.
    pub facility_size: usize,
    /// Residents per staff member.
    pub residents_per_staff: usize,
}

impl Default for ReferenceGeneratorConfig {
    fn default() -> Self {
        Self {
            max_household_size: 6,
            school_size: 150,
            max_workplace_size: 60,
            employment_rate: 0.75,
            community_contacts: 2,
            ltcf_resident_rate: 0.15,
            facility_size: 60,
            residents_per_staff: 3,
        }
    }
}

#[derive(Debug, Clone, Copy)]
struct FacilityPlan {
    use_two_group_reduction: bool,
    average_degree: u32,
}

/// Deterministic generator implementing both generator traits.
///
/// Same seed, size and options produce an identical population.
#[derive(Debug, Clone)]
pub struct ReferenceGenerator {
    seed: u64,
    config: ReferenceGeneratorConfig,
}

impl ReferenceGenerator {
    /// Create a generator with default knobs.
    pub fn new(seed: u64) -> Self {
        Self::with_config(seed, ReferenceGeneratorConfig::default())
    }

    /// Create a generator with custom knobs.
    ///
    /// Rates are clamped to `[0, 1]`; a NaN rate counts as 0.
    pub fn with_config(seed: u64, mut config: ReferenceGeneratorConfig) -> Self {
        config.employment_rate = probability(config.employment_rate);
        config.ltcf_resident_rate = probability(config.ltcf_resident_rate);
        Self { seed, config }
    }

    /// The knobs in use.
    pub fn config(&self) -> &ReferenceGeneratorConfig {
        &self.config
    }

    fn build(
        &self,
        size: usize,
        location: &Location,
        facilities: Option<FacilityPlan>,
    ) -> Result<Population, GenerationError> {
        if size == 0 {
            return Err(GenerationError::EmptyPopulation);
        }
        if size > u32::MAX as usize {
            return Err(GenerationError::Failed(format!("population size {} exceeds id space", size)));
        }
        if location.has_blank_component() {
            return Err(GenerationError::InvalidLocation { location: location.to_string() });
        }

        let mut rng = StdRng::seed_from_u64(self.seed);
        let (mut people, households) = self.sample_households(&mut rng, size);

        let (residents, staff) = match facilities {
            Some(_) => self.assign_facility_roles(&mut rng, &mut people),
            None => (Vec::new(), Vec::new()),
        };

        let source = if facilities.is_some() {
            PopulationSource::SynthesizedWithFacilities
        } else {
            PopulationSource::Synthesized
        };
        let mut population = Population::new(PopulationParams::new(size, location.clone(), source));
        for layer in Layer::GENERAL {
            population.add_layer(layer);
        }

        for person in people.iter() {
            population.add_person(person.clone())?;
        }

        // Residents leave their household; staff leave the general workforce
        for household in &households {
            let members: Vec<PersonId> = household
                .iter()
                .copied()
                .filter(|id| people[id.as_u32() as usize].facility_role != Some(FacilityRole::Resident))
                .collect();
            connect_clique(&mut population, Layer::Household, &members)?;
        }

        self.build_schools(&mut population, &people)?;
        self.build_workplaces(&mut rng, &mut population, &people)?;
        self.build_community(&mut rng, &mut population, size)?;

        if let Some(plan) = facilities {
            population.add_layer(Layer::LongTermCare);
            self.build_facilities(&mut rng, &mut population, &residents, &staff, plan)?;
        }

        tracing::debug!(
            size = size,
            location = %location,
            residents = residents.len(),
            staff = staff.len(),
            "Reference population synthesized"
        );
        Ok(population)
    }

    fn sample_households(&self, rng: &mut StdRng, size: usize) -> (Vec<Person>, Vec<Vec<PersonId>>) {
        let mut people = Vec::with_capacity(size);
        let mut households = Vec::new();
        let max_household = self.config.max_household_size.max(1);

        while people.len() < size {
            let remaining = size - people.len();
            let household_size = rng.gen_range(1..=max_household).min(remaining);
            let head_age: u8 = if rng.gen_bool(0.2) {
                rng.gen_range(65..=99)
            } else {
                rng.gen_range(18..=64)
            };

            let mut members = Vec::with_capacity(household_size);
            for slot in 0..household_size {
                let age = match slot {
                    0 => head_age,
                    1 => (head_age + rng.gen_range(0..=6)).saturating_sub(3).clamp(18, 99),
                    _ if head_age < 60 => rng.gen_range(0..=17),
                    _ => rng.gen_range(18..=99),
                };
                let sex = if rng.gen_bool(0.5) { Sex::Female } else { Sex::Male };
                let id = PersonId::new(people.len() as u32);
                people.push(Person::new(id, age, sex));
                members.push(id);
            }
            households.push(members);
        }

        (people, households)
    }

    fn assign_facility_roles(
        &self,
        rng: &mut StdRng,
        people: &mut [Person],
    ) -> (Vec<PersonId>, Vec<PersonId>) {
        let mut residents = Vec::new();
        for person in people.iter_mut() {
            if person.age >= 70 && rng.gen_bool(self.config.ltcf_resident_rate) {
                person.facility_role = Some(FacilityRole::Resident);
                residents.push(person.id);
            }
        }

        let staff_needed: usize = residents
            .chunks(self.config.facility_size.max(1))
            .map(|facility| facility.len().div_ceil(self.config.residents_per_staff.max(1)))
            .sum();

        let mut candidates: Vec<PersonId> = people
            .iter()
            .filter(|p| (20..=64).contains(&p.age) && p.facility_role.is_none())
            .map(|p| p.id)
            .collect();
        candidates.shuffle(rng);
        candidates.truncate(staff_needed);
        for id in &candidates {
            people[id.as_u32() as usize].facility_role = Some(FacilityRole::Staff);
        }

        (residents, candidates)
    }

    fn build_schools(&self, population: &mut Population, people: &[Person]) -> Result<(), GenerationError> {
        let mut students: Vec<&Person> = people
            .iter()
            .filter(|p| (5..=17).contains(&p.age) && p.facility_role.is_none())
            .collect();
        students.sort_by_key(|p| (p.age, p.id));

        let ids: Vec<PersonId> = students.iter().map(|p| p.id).collect();
        for school in ids.chunks(self.config.school_size.max(1)) {
            connect_clique(population, Layer::School, school)?;
        }
        Ok(())
    }

    fn build_workplaces(
        &self,
        rng: &mut StdRng,
        population: &mut Population,
        people: &[Person],
    ) -> Result<(), GenerationError> {
        let mut workers: Vec<PersonId> = people
            .iter()
            .filter(|p| (18..=64).contains(&p.age) && p.facility_role.is_none())
            .filter(|_| rng.gen_bool(self.config.employment_rate))
            .map(|p| p.id)
            .collect();
        workers.shuffle(rng);

        let max_workplace = self.config.max_workplace_size.max(1);
        let mut rest = workers.as_slice();
        while !rest.is_empty() {
            let take = rng.gen_range(1..=max_workplace).min(rest.len());
            let (workplace, tail) = rest.split_at(take);
            connect_clique(population, Layer::Work, workplace)?;
            rest = tail;
        }
        Ok(())
    }

    fn build_community(
        &self,
        rng: &mut StdRng,
        population: &mut Population,
        size: usize,
    ) -> Result<(), GenerationError> {
        if size < 2 {
            return Ok(());
        }
        for i in 0..size {
            for _ in 0..self.config.community_contacts {
                let other = rng.gen_range(0..size);
                if other != i {
                    population.connect(
                        Layer::Community,
                        PersonId::new(i as u32),
                        PersonId::new(other as u32),
                    )?;
                }
            }
        }
        Ok(())
    }

    fn build_facilities(
        &self,
        rng: &mut StdRng,
        population: &mut Population,
        residents: &[PersonId],
        staff: &[PersonId],
        plan: FacilityPlan,
    ) -> Result<(), GenerationError> {
        let mut staff_pool = staff.iter().copied();
        let per_staff = self.config.residents_per_staff.max(1);

        for facility in residents.chunks(self.config.facility_size.max(1)) {
            let facility_staff: Vec<PersonId> =
                staff_pool.by_ref().take(facility.len().div_ceil(per_staff)).collect();

            if !plan.use_two_group_reduction {
                let members: Vec<PersonId> = facility.iter().chain(&facility_staff).copied().collect();
                connect_clique(population, Layer::LongTermCare, &members)?;
                continue;
            }

            // Two-group reduction: residents mix with residents and staff,
            // staff do not mix with each other, average degree held near target.
            let members = facility.len() + facility_staff.len();
            let max_edges = facility.len() * (facility.len() - 1) / 2 + facility.len() * facility_staff.len();
            let target_edges = (members * plan.average_degree as usize / 2).min(max_edges);

            let mut added = 0;
            let mut attempts = 0;
            while added < target_edges && attempts < target_edges * 20 {
                attempts += 1;
                let a = facility[rng.gen_range(0..facility.len())];
                let b = if facility_staff.is_empty() || rng.gen_bool(facility.len() as f64 / members as f64) {
                    facility[rng.gen_range(0..facility.len())]
                } else {
                    facility_staff[rng.gen_range(0..facility_staff.len())]
                };
                if a != b && population.connect(Layer::LongTermCare, a, b)? {
                    added += 1;
                }
            }
        }
        Ok(())
    }
}

fn probability(rate: f64) -> f64 {
    if rate.is_nan() {
        0.0
    } else {
        rate.clamp(0.0, 1.0)
    }
}

/// Connect every pair in `members`.
fn connect_clique(
    population: &mut Population,
    layer: Layer,
    members: &[PersonId],
) -> Result<(), GenerationError> {
    for (i, a) in members.iter().enumerate() {
        for b in &members[i + 1..] {
            population.connect(layer, *a, *b)?;
        }
    }
    Ok(())
}

impl SyntheticGenerator for ReferenceGenerator {
    fn synthesize(
        &self,
        size: usize,
        location: &Location,
        sheet_name: &str,
    ) -> Result<Population, GenerationError> {
        if sheet_name.trim().is_empty() {
            return Err(GenerationError::UnknownSheet(sheet_name.to_string()));
        }
        self.build(size, location, None)
    }
}

impl FacilityGenerator for ReferenceGenerator {
    fn synthesize_with_facilities(
        &self,
        size: usize,
        location: &Location,
        use_two_group_reduction: bool,
        average_ltcf_degree: u32,
    ) -> Result<Population, GenerationError> {
        self.build(
            size,
            location,
            Some(FacilityPlan {
                use_two_group_reduction,
                average_degree: average_ltcf_degree,
            }),
        )
    }
}
